//! Formatter and row-click handler registry.
//!
//! A [`FormatterRegistry`] decouples renderers from application-specific
//! field customization. Applications register cell formatters and row-click
//! handlers under string ids; renderers resolve them per `(data_type, field)`
//! pair while drawing.
//!
//! # Id shapes
//!
//! | Id | Applies to |
//! |----|------------|
//! | `"products.status"` | field `status` in data of type `products` only |
//! | `"status"` | field `status` in any data type (fallback) |
//! | `"products.onRowClick"` | row clicks in `products` data |
//! | `"onRowClick"` | row clicks in any data type (fallback) |
//!
//! Scoped ids beat generic ids. Re-registering an id overwrites it;
//! unregistering an unknown id is a no-op.
//!
//! There is no process-wide instance: each rendering surface constructs its
//! own registry, so independent surfaces (or parallel tests) never see each
//! other's formatters. Use [`FormatterSet`] to mount and unmount a group of
//! entries together.
//!
//! # Example
//!
//! ```
//! use blockview::registry::{CellValue, FormatterRegistry, Rendered};
//!
//! let mut registry = FormatterRegistry::new();
//! registry.register_formatter("status", |v: &CellValue| Rendered::text(v.to_string().to_uppercase()));
//! registry.register_formatter("products.status", |v: &CellValue| Rendered::badge(v.to_string(), "info"));
//!
//! let cell = CellValue::Text("active".into());
//! assert_eq!(registry.format_cell(Some("orders"), "status", &cell), Rendered::text("ACTIVE"));
//! assert!(matches!(registry.format_cell(Some("products"), "status", &cell), Rendered::Node(_)));
//! ```

pub mod presets;
mod set;
mod value;

pub use set::{FormatterSet, MountHandle};
pub use value::{CellValue, ListItem, Rendered, Row};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

/// Reserved field name for row-click handlers.
pub const ROW_CLICK: &str = "onRowClick";

/// A cell formatter. Must be pure with respect to its argument.
pub type Formatter = Arc<dyn Fn(&CellValue) -> Rendered + Send + Sync>;

/// A row-click handler. Receives the clicked row's data.
pub type RowHandler = Arc<dyn Fn(&Row) + Send + Sync>;

/// Build the scoped id `"<data_type>.<field>"`.
pub fn scoped_id(data_type: &str, field: &str) -> String {
    format!("{data_type}.{field}")
}

/// Lookup table for formatters and row-click handlers.
#[derive(Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Formatter>,
    handlers: HashMap<String, RowHandler>,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatters: Vec<_> = self.formatters.keys().collect();
        formatters.sort();
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("FormatterRegistry")
            .field("formatters", &formatters)
            .field("handlers", &handlers)
            .finish()
    }
}

impl FormatterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Formatters ──

    /// Register a formatter. Replaces any existing formatter with the same id.
    pub fn register_formatter(
        &mut self,
        id: impl Into<String>,
        formatter: impl Fn(&CellValue) -> Rendered + Send + Sync + 'static,
    ) {
        self.insert_formatter(id.into(), Arc::new(formatter));
    }

    /// Register an already-shared formatter.
    pub fn insert_formatter(&mut self, id: String, formatter: Formatter) {
        if self.formatters.insert(id.clone(), formatter).is_some() {
            debug!("Formatter '{id}' replaced");
        } else {
            trace!("Formatter '{id}' registered");
        }
    }

    /// Remove a formatter. No-op if absent.
    pub fn unregister_formatter(&mut self, id: &str) {
        if self.formatters.remove(id).is_some() {
            trace!("Formatter '{id}' unregistered");
        }
    }

    /// Exact-id lookup.
    pub fn get_formatter(&self, id: &str) -> Option<&Formatter> {
        self.formatters.get(id)
    }

    /// Resolve the formatter for `field` in data of type `data_type`:
    /// scoped id first, then the generic field id.
    pub fn resolve_formatter(&self, data_type: Option<&str>, field: &str) -> Option<&Formatter> {
        Self::resolve(&self.formatters, data_type, field)
    }

    /// Resolve and apply a formatter, falling back to the stringified value.
    ///
    /// Formatter panics are not caught here; renderers that must survive a
    /// bad formatter wrap this call (see [`PreviewRenderer`](crate::render::PreviewRenderer)).
    pub fn format_cell(&self, data_type: Option<&str>, field: &str, value: &CellValue) -> Rendered {
        match self.resolve_formatter(data_type, field) {
            Some(formatter) => formatter(value),
            None => Rendered::Text(value.to_string()),
        }
    }

    // ── Row-click handlers ──

    /// Register a row-click handler, conventionally under
    /// `"<data_type>.onRowClick"` or `"onRowClick"`.
    pub fn register_handler(
        &mut self,
        id: impl Into<String>,
        handler: impl Fn(&Row) + Send + Sync + 'static,
    ) {
        self.insert_handler(id.into(), Arc::new(handler));
    }

    /// Register an already-shared handler.
    pub fn insert_handler(&mut self, id: String, handler: RowHandler) {
        if self.handlers.insert(id.clone(), handler).is_some() {
            debug!("Handler '{id}' replaced");
        } else {
            trace!("Handler '{id}' registered");
        }
    }

    /// Remove a handler. No-op if absent.
    pub fn unregister_handler(&mut self, id: &str) {
        if self.handlers.remove(id).is_some() {
            trace!("Handler '{id}' unregistered");
        }
    }

    /// Exact-id lookup.
    pub fn get_handler(&self, id: &str) -> Option<&RowHandler> {
        self.handlers.get(id)
    }

    /// Resolve the row-click handler for `data_type`: `"<data_type>.onRowClick"`,
    /// then `"onRowClick"`.
    pub fn resolve_row_handler(&self, data_type: Option<&str>) -> Option<&RowHandler> {
        Self::resolve(&self.handlers, data_type, ROW_CLICK)
    }

    /// Invoke the resolved row-click handler. Returns `false` if none applies.
    pub fn dispatch_row_click(&self, data_type: Option<&str>, row: &Row) -> bool {
        match self.resolve_row_handler(data_type) {
            Some(handler) => {
                handler(row);
                true
            }
            None => {
                trace!("No row-click handler for {data_type:?}");
                false
            }
        }
    }

    // ── Lifecycle ──

    /// Number of registered formatters.
    pub fn formatter_count(&self) -> usize {
        self.formatters.len()
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty() && self.handlers.is_empty()
    }

    /// Registered formatter ids, sorted.
    pub fn formatter_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Remove every entry. Called when the owning surface goes away.
    pub fn dispose(&mut self) {
        debug!(
            "Disposing registry ({} formatter(s), {} handler(s))",
            self.formatters.len(),
            self.handlers.len()
        );
        self.formatters.clear();
        self.handlers.clear();
    }

    fn resolve<'a, T>(
        table: &'a HashMap<String, T>,
        data_type: Option<&str>,
        field: &str,
    ) -> Option<&'a T> {
        if let Some(data_type) = data_type
            && let Some(entry) = table.get(&scoped_id(data_type, field))
        {
            return Some(entry);
        }
        table.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn constant(label: &'static str) -> impl Fn(&CellValue) -> Rendered + Send + Sync {
        move |_| Rendered::text(label)
    }

    fn status() -> CellValue {
        CellValue::Text("active".into())
    }

    #[test]
    fn scoped_beats_generic() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("products.status", constant("A"));
        registry.register_formatter("status", constant("B"));

        assert_eq!(
            registry.format_cell(Some("products"), "status", &status()),
            Rendered::text("A")
        );
        assert_eq!(
            registry.format_cell(Some("orders"), "status", &status()),
            Rendered::text("B")
        );
    }

    #[test]
    fn resolve_returns_the_registered_function() {
        let mut registry = FormatterRegistry::new();
        let scoped: Formatter = Arc::new(constant("A"));
        registry.insert_formatter("products.status".into(), scoped.clone());
        let resolved = registry.resolve_formatter(Some("products"), "status").unwrap();
        assert!(Arc::ptr_eq(resolved, &scoped));
    }

    #[test]
    fn no_formatter_falls_back_to_stringified_value() {
        let registry = FormatterRegistry::new();
        assert!(registry.resolve_formatter(Some("products"), "price").is_none());
        assert_eq!(
            registry.format_cell(Some("products"), "price", &CellValue::Number(9.5)),
            Rendered::text("9.5")
        );
    }

    #[test]
    fn missing_data_type_uses_generic_only() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("products.status", constant("A"));
        assert!(registry.resolve_formatter(None, "status").is_none());
        registry.register_formatter("status", constant("B"));
        assert_eq!(
            registry.format_cell(None, "status", &status()),
            Rendered::text("B")
        );
    }

    #[test]
    fn last_write_wins() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("status", constant("first"));
        registry.register_formatter("status", constant("second"));
        assert_eq!(registry.formatter_count(), 1);
        assert_eq!(
            registry.format_cell(None, "status", &status()),
            Rendered::text("second")
        );
    }

    #[test]
    fn unregister_unknown_is_a_no_op() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("status", constant("B"));
        registry.unregister_formatter("nonexistent");
        registry.unregister_handler("nonexistent");
        assert_eq!(registry.formatter_ids(), vec!["status"]);
    }

    #[test]
    fn unregister_removes_entry() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("status", constant("B"));
        registry.unregister_formatter("status");
        assert!(registry.get_formatter("status").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn row_handler_resolution_mirrors_formatters() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let mut registry = FormatterRegistry::new();

        let c = clicks.clone();
        registry.register_handler("products.onRowClick", move |_row: &Row| {
            c.lock().unwrap().push("products");
        });
        let c = clicks.clone();
        registry.register_handler(ROW_CLICK, move |_row: &Row| {
            c.lock().unwrap().push("generic");
        });

        let row = json!({"name": "widget"}).as_object().unwrap().clone();
        assert!(registry.dispatch_row_click(Some("products"), &row));
        assert!(registry.dispatch_row_click(Some("orders"), &row));
        assert!(registry.dispatch_row_click(None, &row));
        assert_eq!(*clicks.lock().unwrap(), vec!["products", "generic", "generic"]);
    }

    #[test]
    fn row_click_without_handler_reports_unhandled() {
        let registry = FormatterRegistry::new();
        assert!(!registry.dispatch_row_click(Some("products"), &Row::new()));
    }

    #[test]
    fn handlers_and_formatters_are_separate_namespaces() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter(ROW_CLICK, constant("not a handler"));
        assert!(registry.resolve_row_handler(None).is_none());
        assert_eq!(registry.handler_count(), 0);
    }

    #[test]
    fn dispose_clears_everything() {
        let mut registry = FormatterRegistry::new();
        registry.register_formatter("status", constant("B"));
        registry.register_handler(ROW_CLICK, |_row: &Row| {});
        registry.dispose();
        assert!(registry.is_empty());
    }

    #[test]
    fn independent_registries_do_not_share_state() {
        let mut a = FormatterRegistry::new();
        let b = FormatterRegistry::new();
        a.register_formatter("status", constant("A"));
        assert!(b.get_formatter("status").is_none());
    }
}
