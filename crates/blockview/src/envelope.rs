//! Wire types for tool-result envelopes and the `UiOutput` payload they carry.
//!
//! An envelope can carry its payload in two equivalent encodings: an already
//! decoded `structuredContent` object (or its snake_case alias), or a list of
//! content parts whose first `"text"` part holds the JSON-encoded payload.
//! The [`ResultParser`](crate::parser::ResultParser) decides which one wins.

use std::io::Read;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoadError;

/// Raw boundary object received from a tool invocation.
///
/// All fields are optional. A JSON `null` in either structured field is
/// treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    #[serde(
        rename = "structuredContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<Value>,
    /// snake_case alias some producers emit instead of `structuredContent`.
    #[serde(
        rename = "structured_content",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content_alias: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentPart>,
}

impl ToolResultEnvelope {
    /// Envelope carrying a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            ..Default::default()
        }
    }

    /// Envelope carrying an already-decoded payload.
    pub fn structured(output: Value) -> Self {
        Self {
            structured_content: Some(output),
            ..Default::default()
        }
    }

    /// The structured payload, camelCase first.
    pub fn structured_payload(&self) -> Option<&Value> {
        self.structured_content
            .as_ref()
            .or(self.structured_content_alias.as_ref())
    }
}

/// One part of an envelope's `content` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Discriminator. Only `"text"` is decodable.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// The decoded logical payload: an ordered list of blocks plus a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UiOutput {
    /// Render order follows array order.
    #[serde(default)]
    pub blocks: Vec<UiBlock>,
    /// Free-text description, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One renderable unit inside a [`UiOutput`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UiBlock {
    /// Assumed unique within a `UiOutput`; not enforced.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering: Option<Rendering>,
    /// Reserved for structured (non-string) configuration. Passed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

impl UiBlock {
    /// The JSON-encoded component configuration, if this block has one.
    pub fn rendering_content(&self) -> Option<&str> {
        self.rendering.as_ref().and_then(|r| r.content.as_deref())
    }
}

/// How a block should be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rendering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// JSON-encoded component configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// JSON Schema of [`UiOutput`], used by strict parsing and `--schema`.
pub fn ui_output_schema() -> Value {
    let schema = schemars::schema_for!(UiOutput);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

/// Read an envelope from a JSON file.
pub fn load_envelope(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        source_name: source_name.clone(),
        source,
    })?;
    read_envelope(file, &source_name)
}

/// Read an envelope from any reader (e.g. stdin). `source_name` is used in
/// error messages only.
pub fn read_envelope(mut reader: impl Read, source_name: &str) -> Result<Value, LoadError> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .map_err(|source| LoadError::Io {
            source_name: source_name.to_string(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        source_name: source_name.to_string(),
        source,
    })
}
