//! User-visible error panels.
//!
//! Every failure path ends in an [`ErrorPanel`]: a title, a message, an
//! optional bullet list, and optional raw detail a developer can expand.
//! Panels are plain data; the frontend decides how to draw them.

use serde::Serialize;
use serde_json::Value;

use crate::boundary::RenderFailure;
use crate::error::{ParseError, RenderError};
use crate::validate::ValidationReport;

/// Where a panel came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// The envelope could not be decoded.
    Parse,
    /// A configuration failed structural validation.
    Validation,
    /// A renderer failed on a valid configuration.
    Render,
}

/// A displayable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub kind: PanelKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
    /// Raw payload or stack detail, collapsed by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorPanel {
    /// Panel for an envelope-level failure.
    pub fn from_parse_error(err: &ParseError) -> Self {
        let (bullets, raw) = match err {
            ParseError::InvalidJson { excerpt, .. } => (Vec::new(), Some(excerpt.clone())),
            ParseError::SchemaViolation { errors } => (errors.clone(), None),
            _ => (Vec::new(), None),
        };
        Self {
            kind: PanelKind::Parse,
            title: "Unable to load UI".to_string(),
            message: err.to_string(),
            bullets,
            raw,
        }
    }

    /// Panel for a configuration that failed [`validate`](crate::validate::validate).
    ///
    /// `config` is dumped as pretty JSON into `raw` when given.
    pub fn from_validation(report: &ValidationReport, config: Option<&Value>) -> Self {
        Self {
            kind: PanelKind::Validation,
            title: "Invalid component configuration".to_string(),
            message: format!("{} problem(s) found", report.errors.len()),
            bullets: report.errors.clone(),
            raw: config.and_then(|c| serde_json::to_string_pretty(c).ok()),
        }
    }

    /// Panel for a failure contained by an error boundary.
    pub fn from_failure(failure: &RenderFailure) -> Self {
        let title = match failure.error {
            RenderError::HandlerPanicked(_) => "Row action failed",
            _ => "Component failed to render",
        };
        Self {
            kind: PanelKind::Render,
            title: title.to_string(),
            message: failure.error.to_string(),
            bullets: Vec::new(),
            raw: failure.detail.clone(),
        }
    }

    /// Plain-text rendering for terminals and logs.
    pub fn to_text(&self) -> String {
        let mut out = format!("✖ {}\n  {}\n", self.title, self.message);
        for bullet in &self.bullets {
            out.push_str(&format!("  • {bullet}\n"));
        }
        if let Some(raw) = &self.raw {
            out.push_str("  ── details ──\n");
            for line in raw.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
        out
    }
}

impl From<&ParseError> for ErrorPanel {
    fn from(err: &ParseError) -> Self {
        Self::from_parse_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;

    #[test]
    fn invalid_json_panel_carries_excerpt() {
        let panel = ErrorPanel::from_parse_error(&ParseError::InvalidJson {
            excerpt: "{oops".into(),
            reason: "key must be a string".into(),
        });
        assert_eq!(panel.kind, PanelKind::Parse);
        assert_eq!(panel.raw.as_deref(), Some("{oops"));
        assert!(panel.message.contains("key must be a string"));
    }

    #[test]
    fn validation_panel_lists_every_error() {
        let config = json!({});
        let panel = ErrorPanel::from_validation(&validate(Some(&config)), Some(&config));
        assert_eq!(panel.bullets.len(), 2);
        assert_eq!(panel.raw.as_deref(), Some("{}"));

        let text = panel.to_text();
        assert!(text.contains("• Config object is empty"));
        assert!(text.contains("• Config missing required component definition"));
    }

    #[test]
    fn panel_serializes_without_empty_fields() {
        let panel = ErrorPanel::from_parse_error(&ParseError::NoData);
        let value = serde_json::to_value(&panel).unwrap();
        assert_eq!(value["kind"], "parse");
        assert_eq!(value["message"], "No data in tool result");
        assert!(value.get("bullets").is_none());
        assert!(value.get("raw").is_none());
    }
}
