//! Component kinds and helpers for reading loosely-typed configurations.
//!
//! A component configuration is any JSON object. The only fields the core
//! inspects are `id`, `component`, and `fields`; everything else belongs to
//! the renderer. [`ComponentKind`] turns the `component` discriminator into a
//! closed set of known kinds with a [`Custom`](ComponentKind::Custom) escape
//! hatch, so renderers for new kinds can be registered without touching this
//! crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Legacy discriminator that producers commonly emit for tables.
pub const LEGACY_TABLE: &str = "table";
/// Canonical discriminator for tabular data.
pub const DATA_VIEW: &str = "data-view";

/// The kind of widget a configuration describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    OneCard,
    SetOfCards,
    /// Tabular data. `"table"` parses to this variant.
    DataView,
    Chart,
    Image,
    VideoPlayer,
    /// Any kind this crate does not know about.
    Custom(String),
}

impl ComponentKind {
    /// Parse a discriminator, resolving the `"table"` alias.
    pub fn parse(name: &str) -> Self {
        match name {
            "one-card" => Self::OneCard,
            "set-of-cards" => Self::SetOfCards,
            DATA_VIEW | LEGACY_TABLE => Self::DataView,
            "chart" => Self::Chart,
            "image" => Self::Image,
            "video-player" => Self::VideoPlayer,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Canonical discriminator string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OneCard => "one-card",
            Self::SetOfCards => "set-of-cards",
            Self::DataView => DATA_VIEW,
            Self::Chart => "chart",
            Self::Image => "image",
            Self::VideoPlayer => "video-player",
            Self::Custom(name) => name,
        }
    }

    /// Whether this is one of the built-in kinds.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ComponentKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// The `component` discriminator of a configuration, if it is a string.
pub fn component_of(config: &Value) -> Option<ComponentKind> {
    config
        .get("component")
        .and_then(Value::as_str)
        .map(ComponentKind::parse)
}

/// Stable rendering key: the config's `id`, or `#<index>` when it has none.
///
/// The `#` prefix keeps positional keys apart from an explicit `id` of `"1"`.
pub fn render_key(config: &Value, index: usize) -> String {
    match config.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{index}"),
    }
}

/// The `title` of a configuration, if any.
pub fn title_of(config: &Value) -> Option<&str> {
    config.get("title").and_then(Value::as_str)
}

/// Data type used to scope formatter lookup.
///
/// Producers tag configurations with `input_data_type` (usually the name of
/// the tool that produced the data); `data_type` is accepted as well.
pub fn data_type_of(config: &Value) -> Option<&str> {
    config
        .get("input_data_type")
        .or_else(|| config.get("data_type"))
        .and_then(Value::as_str)
}
