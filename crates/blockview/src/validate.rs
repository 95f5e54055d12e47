//! Structural validation and canonical-name normalization of configurations.
//!
//! [`validate`] is a sanity check, not a schema validation: it only decides
//! whether a configuration is well-formed enough to hand to a renderer.
//! Per-kind shape checks belong to the renderer. [`normalize`] rewrites the
//! legacy `"table"` discriminator to `"data-view"`.
//!
//! Validation runs on the pre-rewrite form; normalization is applied just
//! before renderer handoff.

use serde::Serialize;
use serde_json::Value;

use crate::component::{DATA_VIEW, LEGACY_TABLE};

pub const ERR_NULL: &str = "Config is null or undefined";
pub const ERR_NOT_OBJECT: &str = "Config must be an object";
pub const ERR_EMPTY: &str = "Config object is empty";
pub const ERR_NO_DEFINITION: &str = "Config missing required component definition";

/// Fields whose presence marks an object as a component definition.
const DEFINITION_FIELDS: [&str; 3] = ["id", "component", "fields"];

/// Outcome of [`validate`]. All violated rules are listed, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Decide whether a configuration is renderable.
///
/// `None` and JSON `null` are both treated as absent. Never panics.
pub fn validate(config: Option<&Value>) -> ValidationReport {
    let mut errors = Vec::new();

    let map = match config {
        None | Some(Value::Null) => {
            errors.push(ERR_NULL.to_string());
            return ValidationReport::from_errors(errors);
        }
        Some(Value::Object(map)) => map,
        Some(_) => {
            errors.push(ERR_NOT_OBJECT.to_string());
            return ValidationReport::from_errors(errors);
        }
    };

    if map.is_empty() {
        errors.push(ERR_EMPTY.to_string());
    }
    if !DEFINITION_FIELDS.iter().any(|f| map.contains_key(*f)) {
        errors.push(ERR_NO_DEFINITION.to_string());
    }

    ValidationReport::from_errors(errors)
}

/// Rewrite `component: "table"` to `component: "data-view"`.
///
/// Returns a copy; the input is never mutated. Idempotent and total.
pub fn normalize(config: &Value) -> Value {
    let mut out = config.clone();
    if let Value::Object(map) = &mut out
        && map.get("component").and_then(Value::as_str) == Some(LEGACY_TABLE)
    {
        map.insert("component".to_string(), Value::String(DATA_VIEW.to_string()));
    }
    out
}
