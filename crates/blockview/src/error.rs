//! Error types for parsing, rendering, and envelope loading.
//!
//! Envelope-level decoding failures are [`ParseError`]s and fail the whole
//! parse. Renderer failures are [`RenderError`]s and are contained by an
//! [`ErrorBoundary`](crate::boundary::ErrorBoundary). Per-config structural
//! problems are not errors at all: they are reported as a
//! [`ValidationReport`](crate::validate::ValidationReport) list.

use thiserror::Error;

/// Failure to decode a tool-result envelope into a `UiOutput`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The envelope is present but carries no usable content at all.
    #[error("No data in tool result")]
    NoData,

    /// The first content part has a type the parser cannot decode.
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// A text content part that does not decode as a `UiOutput`.
    ///
    /// `excerpt` is bounded by
    /// [`ParserConfig::excerpt_chars`](crate::parser::ParserConfig::excerpt_chars).
    #[error("Invalid JSON in tool result: {reason}")]
    InvalidJson { excerpt: String, reason: String },

    /// The envelope or its decoded payload has the wrong shape (e.g. the
    /// envelope is not an object, or `blocks` is not an array).
    #[error("Malformed tool result: {reason}")]
    Malformed { reason: String },

    /// Strict mode only: the decoded payload violates the `UiOutput` schema.
    #[error("Tool result failed schema validation ({} error(s))", errors.len())]
    SchemaViolation { errors: Vec<String> },
}

/// Failure raised while a renderer processes a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No renderer is registered for the component kind and there is no
    /// fallback renderer.
    #[error("No renderer registered for component '{0}'")]
    UnknownComponent(String),

    /// The configuration carries no `component` discriminator.
    #[error("Config has no component discriminator")]
    MissingComponent,

    /// The renderer rejected the configuration.
    #[error("{component} renderer failed: {message}")]
    Failed { component: String, message: String },

    /// The renderer (or a formatter it invoked) panicked.
    #[error("Renderer panicked: {0}")]
    Panicked(String),

    /// A row-click handler panicked.
    #[error("Row-click handler panicked: {0}")]
    HandlerPanicked(String),
}

impl RenderError {
    /// Convenience constructor for [`RenderError::Failed`].
    pub fn failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Failure to load an envelope from a file or reader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name} is not valid JSON: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}
