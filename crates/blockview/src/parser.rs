//! Tool-result envelope parsing.
//!
//! [`ResultParser`] turns a raw envelope into an ordered list of decoded
//! component configurations. Decoding the envelope itself is all-or-nothing
//! (a [`ParseError`]); decoding individual blocks is best-effort, so one
//! block with bad inner JSON is dropped and recorded while its siblings
//! survive.
//!
//! ```text
//! envelope ─▶ structuredContent? ──yes──▶ UiOutput value
//!                  │ no
//!                  ▼
//!             content[0] ─"text"─▶ JSON decode ─▶ UiOutput value
//!
//! UiOutput value ─▶ (strict schema check) ─▶ blocks ─▶ rendering.content ─▶ configs
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::envelope::{ToolResultEnvelope, UiBlock, ui_output_schema};
use crate::error::ParseError;

/// Default length of the raw-text excerpt in [`ParseError::InvalidJson`].
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// Marker appended to a truncated excerpt.
pub const ELLIPSIS: &str = "...";

// ── Configuration ──────────────────────────────────────────────────

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum characters of raw text quoted in an invalid-JSON error.
    /// Default: [`DEFAULT_EXCERPT_CHARS`].
    pub excerpt_chars: usize,
    /// Check the decoded payload against the `UiOutput` JSON Schema before
    /// extracting blocks. Default: `false`.
    pub strict_schema: bool,
    /// Accept the snake_case `structured_content` alias. Default: `true`.
    pub accept_snake_case: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            strict_schema: false,
            accept_snake_case: true,
        }
    }
}

impl ParserConfig {
    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    pub fn with_snake_case(mut self, accept: bool) -> Self {
        self.accept_snake_case = accept;
        self
    }
}

// ── Output types ───────────────────────────────────────────────────

/// Result of a successful [`ResultParser::parse`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// No envelope yet. Callers should show a loading state.
    Pending,
    Parsed(ParsedOutput),
}

impl ParseOutcome {
    /// The parsed output, if any.
    pub fn parsed(self) -> Option<ParsedOutput> {
        match self {
            Self::Pending => None,
            Self::Parsed(out) => Some(out),
        }
    }
}

/// Decoded configurations in block order, plus what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedOutput {
    pub configs: Vec<ParsedConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub dropped: Vec<DroppedBlock>,
}

/// One decoded component configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedConfig {
    /// `id` of the block this configuration came from.
    pub block_id: String,
    /// Position of the block in the payload's `blocks` array.
    pub block_index: usize,
    /// The decoded configuration. Not yet validated or normalized.
    pub config: Value,
}

/// A block that did not produce a configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedBlock {
    pub block_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub reason: DropReason,
}

/// Why a block was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// The block has no `rendering.content`. Not an error.
    NotRenderable,
    /// The block itself does not have the `UiBlock` shape.
    MalformedBlock(String),
    /// `rendering.content` is not valid JSON.
    InvalidContent(String),
}

impl DropReason {
    /// Whether this drop is worth surfacing to a developer.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::NotRenderable)
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRenderable => f.write_str("no rendering content"),
            Self::MalformedBlock(e) => write!(f, "malformed block: {e}"),
            Self::InvalidContent(e) => write!(f, "invalid rendering content: {e}"),
        }
    }
}

// ── Parser ─────────────────────────────────────────────────────────

/// Envelope parser. Cheap to construct; holds a compiled schema validator
/// when strict mode is on.
pub struct ResultParser {
    config: ParserConfig,
    schema: Option<jsonschema::Validator>,
}

impl fmt::Debug for ResultParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultParser")
            .field("config", &self.config)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ResultParser {
    pub fn new(config: ParserConfig) -> Self {
        let schema = if config.strict_schema {
            match jsonschema::validator_for(&ui_output_schema()) {
                Ok(v) => Some(v),
                Err(e) => {
                    // The schema is generated from our own types, so this
                    // only happens on a jsonschema/schemars mismatch.
                    warn!("UiOutput schema failed to compile, strict mode disabled: {e}");
                    None
                }
            }
        } else {
            None
        };
        Self { config, schema }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a raw envelope value.
    ///
    /// `None` and JSON `null` yield [`ParseOutcome::Pending`].
    pub fn parse(&self, envelope: Option<&Value>) -> Result<ParseOutcome, ParseError> {
        let envelope = match envelope {
            None | Some(Value::Null) => {
                trace!("No envelope yet");
                return Ok(ParseOutcome::Pending);
            }
            Some(v) => v,
        };
        let envelope =
            ToolResultEnvelope::deserialize(envelope).map_err(|e| ParseError::Malformed {
                reason: format!("envelope: {e}"),
            })?;
        self.parse_envelope(&envelope).map(ParseOutcome::Parsed)
    }

    /// Parse an already-typed envelope.
    pub fn parse_envelope(
        &self,
        envelope: &ToolResultEnvelope,
    ) -> Result<ParsedOutput, ParseError> {
        let structured = if self.config.accept_snake_case {
            envelope.structured_payload()
        } else {
            envelope.structured_content.as_ref()
        };

        match structured {
            Some(output) => {
                debug!("Using structured content");
                self.extract(output)
            }
            None => {
                let output = self.decode_text_part(envelope)?;
                self.extract(&output)
            }
        }
    }

    /// Decode `content[0]` into a payload value.
    fn decode_text_part(&self, envelope: &ToolResultEnvelope) -> Result<Value, ParseError> {
        let part = envelope.content.first().ok_or(ParseError::NoData)?;
        if part.kind != "text" {
            return Err(ParseError::UnsupportedContentType {
                content_type: if part.kind.is_empty() {
                    "<missing>".to_string()
                } else {
                    part.kind.clone()
                },
            });
        }
        let text = part.text.as_deref().unwrap_or_default();
        serde_json::from_str(text).map_err(|e| {
            let excerpt = excerpt(text, self.config.excerpt_chars);
            warn!("Tool result text is not valid JSON: {e} (text: {excerpt})");
            ParseError::InvalidJson {
                excerpt,
                reason: e.to_string(),
            }
        })
    }

    /// Pull configurations out of a decoded payload.
    fn extract(&self, output: &Value) -> Result<ParsedOutput, ParseError> {
        let Value::Object(map) = output else {
            return Err(ParseError::Malformed {
                reason: format!("UI output must be an object, got {}", json_type(output)),
            });
        };

        if let Some(validator) = &self.schema {
            let errors: Vec<String> = validator
                .iter_errors(output)
                .map(|e| format!("{}: {e}", e.instance_path()))
                .collect();
            if !errors.is_empty() {
                warn!("UI output failed schema validation: {}", errors.join("; "));
                return Err(ParseError::SchemaViolation { errors });
            }
        }

        let blocks = match map.get("blocks") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(blocks)) => blocks.as_slice(),
            Some(other) => {
                return Err(ParseError::Malformed {
                    reason: format!("`blocks` must be an array, got {}", json_type(other)),
                });
            }
        };
        let summary = map
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut parsed = ParsedOutput {
            summary,
            ..Default::default()
        };

        for (block_index, raw) in blocks.iter().enumerate() {
            let block = match UiBlock::deserialize(raw) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Dropping block {block_index}: {e}");
                    parsed.dropped.push(DroppedBlock {
                        block_index,
                        block_id: raw.get("id").and_then(Value::as_str).map(str::to_string),
                        reason: DropReason::MalformedBlock(e.to_string()),
                    });
                    continue;
                }
            };

            let Some(content) = block.rendering_content() else {
                debug!("Skipping block {} without rendering content", block.id);
                parsed.dropped.push(DroppedBlock {
                    block_index,
                    block_id: Some(block.id.clone()),
                    reason: DropReason::NotRenderable,
                });
                continue;
            };

            match serde_json::from_str::<Value>(content) {
                Ok(config) => parsed.configs.push(ParsedConfig {
                    block_id: block.id.clone(),
                    block_index,
                    config,
                }),
                Err(e) => {
                    warn!(
                        "Dropping block {}: invalid rendering content: {e} (content: {})",
                        block.id,
                        excerpt(content, self.config.excerpt_chars)
                    );
                    parsed.dropped.push(DroppedBlock {
                        block_index,
                        block_id: Some(block.id.clone()),
                        reason: DropReason::InvalidContent(e.to_string()),
                    });
                }
            }
        }

        debug!(
            "Parsed {} config(s), dropped {} block(s)",
            parsed.configs.len(),
            parsed.dropped.len()
        );
        Ok(parsed)
    }
}

/// Parse an envelope with default settings.
pub fn parse_envelope(envelope: Option<&Value>) -> Result<ParseOutcome, ParseError> {
    ResultParser::default().parse(envelope)
}

/// First `max_chars` characters of `text`, with [`ELLIPSIS`] appended when
/// anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
