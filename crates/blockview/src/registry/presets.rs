//! Ready-made formatters used by the CLI preview and the web harness.
//!
//! These double as examples of the two key shapes: generic formatters
//! (`status`, `price`, `tags`) and a scoped one (`products.status`) that
//! overrides the generic `status` badge for product data.

use tracing::info;

use super::{CellValue, FormatterSet, ROW_CLICK, Rendered, Row};

/// Name of the set returned by [`demo_set`].
pub const DEMO_SET: &str = "demo";

/// Badge variant for a status string.
pub fn status_variant(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "active" | "running" | "ready" | "succeeded" | "in stock" => "success",
        "pending" | "warning" | "degraded" | "low stock" => "warning",
        "failed" | "error" | "crashloopbackoff" | "out of stock" | "discontinued" => "danger",
        _ => "info",
    }
}

/// Generic `status` formatter: renders a colored badge.
pub fn status_badge(value: &CellValue) -> Rendered {
    let label = value.to_string();
    if label.is_empty() {
        return Rendered::text("");
    }
    let variant = status_variant(&label);
    Rendered::badge(label, variant)
}

/// Scoped `products.status` formatter: stock levels read better as text.
pub fn product_status(value: &CellValue) -> Rendered {
    match value.as_str() {
        Some(s) if s.eq_ignore_ascii_case("discontinued") => Rendered::text("Discontinued"),
        _ => status_badge(value),
    }
}

/// Generic `price` formatter: two decimals with a dollar sign. Non-numeric
/// values are shown unchanged.
pub fn price(value: &CellValue) -> Rendered {
    match value.as_f64() {
        Some(n) => Rendered::text(format!("${n:.2}")),
        None => Rendered::text(value.to_string()),
    }
}

/// Generic `tags` formatter: `#a #b #c`.
pub fn tags(value: &CellValue) -> Rendered {
    match value {
        CellValue::List(items) => Rendered::text(
            items
                .iter()
                .map(|item| format!("#{item}"))
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => Rendered::text(other.to_string()),
    }
}

/// Generic row-click handler that logs the clicked row.
pub fn log_row_click(row: &Row) {
    let label = row
        .get("name")
        .or_else(|| row.get("id"))
        .map(|v| v.to_string())
        .unwrap_or_else(|| format!("{} field(s)", row.len()));
    info!("Row clicked: {label}");
}

/// The demo set: every formatter above plus the logging row-click handler.
pub fn demo_set() -> FormatterSet {
    FormatterSet::new(DEMO_SET)
        .formatter("status", status_badge)
        .formatter("products.status", product_status)
        .formatter("price", price)
        .formatter("tags", tags)
        .handler(ROW_CLICK, log_row_click)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormatterRegistry;

    #[test]
    fn status_variants() {
        assert_eq!(status_variant("Running"), "success");
        assert_eq!(status_variant("Pending"), "warning");
        assert_eq!(status_variant("CrashLoopBackOff"), "danger");
        assert_eq!(status_variant("whatever"), "info");
    }

    #[test]
    fn price_formats_numbers_and_numeric_text() {
        assert_eq!(price(&CellValue::Number(5.0)), Rendered::text("$5.00"));
        assert_eq!(price(&CellValue::Text("12.349".into())), Rendered::text("$12.35"));
        assert_eq!(price(&CellValue::Text("free".into())), Rendered::text("free"));
    }

    #[test]
    fn tags_join_lists() {
        let value = CellValue::from_json(&serde_json::json!(["new", "sale"]));
        assert_eq!(tags(&value), Rendered::text("#new #sale"));
    }

    #[test]
    fn demo_set_scopes_product_status() {
        let mut registry = FormatterRegistry::new();
        let _handle = demo_set().mount(&mut registry);
        let discontinued = CellValue::Text("discontinued".into());
        assert_eq!(
            registry.format_cell(Some("products"), "status", &discontinued),
            Rendered::text("Discontinued")
        );
        assert!(matches!(
            registry.format_cell(Some("orders"), "status", &discontinued),
            Rendered::Node(_)
        ));
        assert!(registry.resolve_row_handler(Some("products")).is_some());
    }
}
