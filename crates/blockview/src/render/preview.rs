//! Built-in renderer for every known component kind.
//!
//! Configurations carry their data column-wise:
//!
//! ```json
//! {
//!   "component": "data-view",
//!   "title": "Products",
//!   "input_data_type": "products",
//!   "fields": [
//!     {"name": "Name",   "data_path": "products[*].name",   "data": ["Widget", "Gadget"]},
//!     {"name": "Status", "data_path": "products[*].status", "data": ["active", "pending"]}
//!   ]
//! }
//! ```
//!
//! Row `i` is built from element `i` of every field's `data`. Each cell goes
//! through the registry, keyed by the field's key (see [`field_key`]).

use std::panic::{self, AssertUnwindSafe};

use serde_json::{Map, Value};
use tracing::warn;

use super::{Card, Column, ComponentRenderer, LabeledValue, View, ViewBody, ViewRow};
use crate::boundary::panic_message;
use crate::component::{ComponentKind, component_of, data_type_of, title_of};
use crate::error::RenderError;
use crate::registry::{CellValue, FormatterRegistry, Rendered, Row};

/// Renders data views as tables, cards as label/value lists, and media and
/// charts as a one-line description.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewRenderer;

impl ComponentRenderer for PreviewRenderer {
    fn kinds(&self) -> Vec<ComponentKind> {
        vec![
            ComponentKind::OneCard,
            ComponentKind::SetOfCards,
            ComponentKind::DataView,
            ComponentKind::Chart,
            ComponentKind::Image,
            ComponentKind::VideoPlayer,
        ]
    }

    fn render(&self, config: &Value, registry: &FormatterRegistry) -> Result<View, RenderError> {
        let kind = component_of(config).ok_or(RenderError::MissingComponent)?;
        let title = title_of(config).map(str::to_string);
        let body = match &kind {
            ComponentKind::DataView => table(config, registry)?,
            ComponentKind::OneCard => ViewBody::Cards {
                cards: vec![one_card(config, registry)?],
            },
            ComponentKind::SetOfCards => ViewBody::Cards {
                cards: card_set(config, registry)?,
            },
            ComponentKind::Chart => ViewBody::Summary {
                text: chart_summary(config),
            },
            ComponentKind::Image => ViewBody::Summary {
                text: format!("Image: {}", media_source(config)),
            },
            ComponentKind::VideoPlayer => ViewBody::Summary {
                text: format!("Video: {}", media_source(config)),
            },
            ComponentKind::Custom(name) => return Err(RenderError::UnknownComponent(name.clone())),
        };
        Ok(View {
            component: kind,
            title,
            body,
        })
    }
}

// ── Field access ───────────────────────────────────────────────────

/// Key a field's values are stored and formatted under.
///
/// The field's `id` when present, else the last segment of its `data_path`
/// (`"products[*].status"` → `"status"`), else its lowercased `name` with
/// spaces replaced by underscores.
pub fn field_key(field: &Value) -> Option<String> {
    if let Some(id) = field.get("id").and_then(Value::as_str)
        && !id.is_empty()
    {
        return Some(id.to_string());
    }
    if let Some(path) = field.get("data_path").and_then(Value::as_str) {
        let last = path.rsplit('.').next().unwrap_or(path).replace("[*]", "");
        if !last.is_empty() {
            return Some(last);
        }
    }
    field
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(|n| n.to_lowercase().replace(' ', "_"))
}

fn field_label(field: &Value, key: &str) -> String {
    field
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string()
}

fn field_data(field: &Value) -> &[Value] {
    field
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `(key, label, data)` for every usable field, in order.
fn fields<'a>(
    config: &'a Value,
    component: &str,
) -> Result<Vec<(String, String, &'a [Value])>, RenderError> {
    let fields = match config.get("fields") {
        Some(Value::Array(fields)) => fields,
        Some(_) => return Err(RenderError::failed(component, "'fields' must be an array")),
        None => return Err(RenderError::failed(component, "no fields to render")),
    };
    Ok(fields
        .iter()
        .filter_map(|field| {
            let key = field_key(field)?;
            let label = field_label(field, &key);
            Some((key, label, field_data(field)))
        })
        .collect())
}

/// Reassemble column-wise field data into rows.
///
/// The row count is the longest `data` array; shorter columns are padded
/// with `null`. Configurations without a usable `fields` array have no rows.
pub fn rows_of(config: &Value) -> Vec<Row> {
    let Ok(fields) = fields(config, "") else {
        return Vec::new();
    };
    let count = fields.iter().map(|(_, _, data)| data.len()).max().unwrap_or(0);
    (0..count)
        .map(|i| {
            fields
                .iter()
                .map(|(key, _, data)| (key.clone(), data.get(i).cloned().unwrap_or(Value::Null)))
                .collect::<Map<String, Value>>()
        })
        .collect()
}

/// Format one cell, isolating formatter panics to the cell.
fn format_cell(
    registry: &FormatterRegistry,
    data_type: Option<&str>,
    field: &str,
    value: &Value,
) -> Rendered {
    let cell = CellValue::from_json(value);
    match panic::catch_unwind(AssertUnwindSafe(|| registry.format_cell(data_type, field, &cell))) {
        Ok(rendered) => rendered,
        Err(payload) => {
            warn!(
                "Formatter for '{field}' panicked ({}), showing raw value",
                panic_message(payload.as_ref())
            );
            Rendered::Text(cell.to_string())
        }
    }
}

// ── Kinds ──────────────────────────────────────────────────────────

fn table(config: &Value, registry: &FormatterRegistry) -> Result<ViewBody, RenderError> {
    let data_type = data_type_of(config);
    let columns: Vec<Column> = fields(config, "data-view")?
        .into_iter()
        .map(|(key, label, _)| Column { key, label })
        .collect();
    let rows = rows_of(config)
        .into_iter()
        .map(|data| {
            let cells = columns
                .iter()
                .map(|col| {
                    let value = data.get(&col.key).unwrap_or(&Value::Null);
                    format_cell(registry, data_type, &col.key, value)
                })
                .collect();
            ViewRow { cells, data }
        })
        .collect();
    Ok(ViewBody::Table {
        data_type: data_type.map(str::to_string),
        columns,
        rows,
    })
}

fn one_card(config: &Value, registry: &FormatterRegistry) -> Result<Card, RenderError> {
    let data_type = data_type_of(config);
    let fields = fields(config, "one-card")?;
    if fields.is_empty() {
        return Err(RenderError::failed("one-card", "no fields to render"));
    }
    let fields = fields
        .into_iter()
        .map(|(key, label, data)| {
            // A single-element column is a scalar; anything else is shown as a list.
            let value = match data {
                [single] => single.clone(),
                many => Value::Array(many.to_vec()),
            };
            LabeledValue {
                value: format_cell(registry, data_type, &key, &value),
                label,
            }
        })
        .collect();
    Ok(Card {
        title: None,
        fields,
    })
}

fn card_set(config: &Value, registry: &FormatterRegistry) -> Result<Vec<Card>, RenderError> {
    let data_type = data_type_of(config);
    let fields = fields(config, "set-of-cards")?;
    Ok(rows_of(config)
        .iter()
        .map(|row| Card {
            title: None,
            fields: fields
                .iter()
                .map(|(key, label, _)| LabeledValue {
                    label: label.clone(),
                    value: format_cell(
                        registry,
                        data_type,
                        key,
                        row.get(key).unwrap_or(&Value::Null),
                    ),
                })
                .collect(),
        })
        .collect())
}

fn chart_summary(config: &Value) -> String {
    let chart_type = config
        .get("chart_type")
        .or_else(|| config.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let series: Vec<String> = fields(config, "chart")
        .map(|f| f.into_iter().map(|(_, label, _)| label).collect())
        .unwrap_or_default();
    if series.is_empty() {
        format!("Chart ({chart_type})")
    } else {
        format!("Chart ({chart_type}): {}", series.join(", "))
    }
}

fn media_source(config: &Value) -> &str {
    ["url", "src", "image_url", "video_url"]
        .iter()
        .find_map(|k| config.get(*k).and_then(Value::as_str))
        .unwrap_or("(no source)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products() -> Value {
        json!({
            "component": "data-view",
            "title": "Products",
            "input_data_type": "products",
            "fields": [
                {"name": "Name", "data_path": "products[*].name", "data": ["Widget", "Gadget"]},
                {"name": "Status", "data_path": "products[*].status", "data": ["active"]}
            ]
        })
    }

    #[test]
    fn field_key_sources() {
        assert_eq!(field_key(&json!({"id": "sku", "name": "SKU"})).as_deref(), Some("sku"));
        assert_eq!(
            field_key(&json!({"data_path": "products[*].unit_price"})).as_deref(),
            Some("unit_price")
        );
        assert_eq!(field_key(&json!({"data_path": "tags[*]"})).as_deref(), Some("tags"));
        assert_eq!(field_key(&json!({"name": "In Stock"})).as_deref(), Some("in_stock"));
        assert_eq!(field_key(&json!({})), None);
    }

    #[test]
    fn rows_are_padded_with_null() {
        let rows = rows_of(&products());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Widget");
        assert_eq!(rows[1]["status"], Value::Null);
        assert!(rows_of(&json!({"component": "data-view"})).is_empty());
    }

    #[test]
    fn table_uses_scoped_formatters() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("products.status", |v: &CellValue| {
            Rendered::text(v.to_string().to_uppercase())
        });
        let view = PreviewRenderer.render(&products(), &registry).unwrap();
        let ViewBody::Table { rows, columns, data_type } = &view.body else {
            panic!("expected a table, got {:?}", view.body);
        };
        assert_eq!(data_type.as_deref(), Some("products"));
        assert_eq!(columns[1].label, "Status");
        assert_eq!(rows[0].cells[1], Rendered::text("ACTIVE"));
        // Padded cells still go through the formatter, as null.
        assert_eq!(rows[1].cells[1], Rendered::text(""));
    }

    #[test]
    fn panicking_formatter_only_affects_its_cells() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("status", |_: &CellValue| -> Rendered { panic!("bad formatter") });
        let view = PreviewRenderer.render(&products(), &registry).unwrap();
        let ViewBody::Table { rows, .. } = &view.body else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].cells[0], Rendered::text("Widget"));
        assert_eq!(rows[0].cells[1], Rendered::text("active"));
    }

    #[test]
    fn table_without_fields_fails() {
        let err = PreviewRenderer
            .render(&json!({"component": "data-view"}), &FormatterRegistry::new())
            .unwrap_err();
        assert_eq!(err, RenderError::failed("data-view", "no fields to render"));
    }

    #[test]
    fn one_card_lists_fields() {
        let config = json!({
            "component": "one-card",
            "title": "Widget",
            "fields": [
                {"name": "Price", "data_path": "p.price", "data": [19.5]},
                {"name": "Tags", "data_path": "p.tags", "data": ["new", "sale"]}
            ]
        });
        let view = PreviewRenderer.render(&config, &FormatterRegistry::new()).unwrap();
        assert_eq!(view.to_text(), "Widget\n  Price: 19.5\n  Tags: new, sale\n");
    }

    #[test]
    fn set_of_cards_has_one_card_per_row() {
        let mut config = products();
        config["component"] = json!("set-of-cards");
        let view = PreviewRenderer.render(&config, &FormatterRegistry::new()).unwrap();
        let ViewBody::Cards { cards } = &view.body else {
            panic!("expected cards");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].fields[0].value, Rendered::text("Gadget"));
    }

    #[test]
    fn media_and_charts_summarize() {
        let registry = FormatterRegistry::new();
        let image = PreviewRenderer
            .render(&json!({"component": "image", "url": "cat.png"}), &registry)
            .unwrap();
        assert_eq!(image.to_text(), "Image: cat.png\n");

        let chart = PreviewRenderer
            .render(
                &json!({"component": "chart", "chart_type": "bar",
                        "fields": [{"name": "Sales", "data": [1, 2]}]}),
                &registry,
            )
            .unwrap();
        assert_eq!(chart.to_text(), "Chart (bar): Sales\n");

        let video = PreviewRenderer
            .render(&json!({"component": "video-player"}), &registry)
            .unwrap();
        assert_eq!(video.to_text(), "Video: (no source)\n");
    }
}
