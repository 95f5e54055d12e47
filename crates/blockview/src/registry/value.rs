//! Values flowing through formatters: raw cells in, renderables out.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of data handed to a row-click handler, keyed by field name.
pub type Row = Map<String, Value>;

/// A raw field value as found in a configuration's data arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ListItem>),
}

/// An element of a [`CellValue::List`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Convert an arbitrary JSON value.
    ///
    /// Objects (and list elements that are neither strings nor numbers) have
    /// no cell representation and are carried as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Number(n) => ListItem::Number(n.as_f64().unwrap_or_default()),
                        Value::String(s) => ListItem::Text(s.clone()),
                        other => ListItem::Text(other.to_string()),
                    })
                    .collect(),
            ),
            Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Default (unformatted) string representation of a cell.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// What a formatter produces: plain text, or a structured node the
/// renderer knows how to draw (badge, link, icon, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rendered {
    Text(String),
    Node(Value),
}

impl Rendered {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// A badge node: `{"type": "badge", "label": ..., "variant": ...}`.
    pub fn badge(label: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::Node(serde_json::json!({
            "type": "badge",
            "label": label.into(),
            "variant": variant.into(),
        }))
    }

    /// Best-effort plain-text view, for text previews and logs.
    ///
    /// Nodes render as their `label` or `text` field when they have one,
    /// otherwise as compact JSON.
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Node(node) => node
                .get("label")
                .or_else(|| node.get("text"))
                .and_then(Value::as_str)
                .map(|s| match node.get("type").and_then(Value::as_str) {
                    Some("badge") => format!("[{s}]"),
                    _ => s.to_string(),
                })
                .unwrap_or_else(|| node.to_string()),
        }
    }
}

impl From<String> for Rendered {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Rendered {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cell_from_json_covers_all_shapes() {
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Null);
        assert_eq!(CellValue::from_json(&json!(true)), CellValue::Bool(true));
        assert_eq!(CellValue::from_json(&json!(2.5)), CellValue::Number(2.5));
        assert_eq!(
            CellValue::from_json(&json!("ok")),
            CellValue::Text("ok".into())
        );
        assert_eq!(
            CellValue::from_json(&json!(["a", 1])),
            CellValue::List(vec![ListItem::Text("a".into()), ListItem::Number(1.0)])
        );
        assert_eq!(
            CellValue::from_json(&json!({"k": 1})),
            CellValue::Text(r#"{"k":1}"#.into())
        );
    }

    #[test]
    fn default_display_is_stringified() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(19.99).to_string(), "19.99");
        assert_eq!(
            CellValue::from_json(&json!(["x", "y", 3])).to_string(),
            "x, y, 3"
        );
    }

    #[test]
    fn numeric_text_parses_as_number() {
        assert_eq!(CellValue::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(CellValue::Text("n/a".into()).as_f64(), None);
    }

    #[test]
    fn plain_text_of_nodes() {
        assert_eq!(Rendered::badge("Active", "success").to_plain_text(), "[Active]");
        assert_eq!(
            Rendered::Node(json!({"type": "link", "text": "docs"})).to_plain_text(),
            "docs"
        );
        assert_eq!(
            Rendered::Node(json!({"icon": "x"})).to_plain_text(),
            r#"{"icon":"x"}"#
        );
    }
}
