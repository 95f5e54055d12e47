//! Groups of registry entries mounted and unmounted together.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{CellValue, Formatter, FormatterRegistry, Rendered, Row, RowHandler};

/// A named bundle of formatters and handlers.
///
/// Build the bundle once, then [`mount`](FormatterSet::mount) it into a
/// registry when a surface appears and [`unmount`](FormatterRegistry::unmount)
/// the returned handle when it goes away.
///
/// ```
/// use blockview::registry::{CellValue, FormatterRegistry, FormatterSet, Rendered};
///
/// let set = FormatterSet::new("demo")
///     .formatter("status", |v: &CellValue| Rendered::badge(v.to_string(), "info"));
///
/// let mut registry = FormatterRegistry::new();
/// let handle = set.mount(&mut registry);
/// assert!(registry.get_formatter("status").is_some());
///
/// registry.unmount(handle);
/// assert!(registry.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct FormatterSet {
    name: String,
    formatters: Vec<(String, Formatter)>,
    handlers: Vec<(String, RowHandler)>,
}

impl fmt::Debug for FormatterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterSet")
            .field("name", &self.name)
            .field(
                "formatters",
                &self.formatters.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field(
                "handlers",
                &self.handlers.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FormatterSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a formatter (builder pattern).
    pub fn formatter(
        mut self,
        id: impl Into<String>,
        formatter: impl Fn(&CellValue) -> Rendered + Send + Sync + 'static,
    ) -> Self {
        self.formatters.push((id.into(), Arc::new(formatter)));
        self
    }

    /// Add a row-click handler (builder pattern).
    pub fn handler(
        mut self,
        id: impl Into<String>,
        handler: impl Fn(&Row) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push((id.into(), Arc::new(handler)));
        self
    }

    /// Number of entries in the set.
    pub fn len(&self) -> usize {
        self.formatters.len() + self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty() && self.handlers.is_empty()
    }

    /// Register every entry into `registry`, overwriting same-id entries.
    pub fn mount(&self, registry: &mut FormatterRegistry) -> MountHandle {
        for (id, formatter) in &self.formatters {
            registry.insert_formatter(id.clone(), formatter.clone());
        }
        for (id, handler) in &self.handlers {
            registry.insert_handler(id.clone(), handler.clone());
        }
        debug!("Mounted formatter set '{}' ({} entries)", self.name, self.len());
        MountHandle {
            set_name: self.name.clone(),
            formatter_ids: self.formatters.iter().map(|(id, _)| id.clone()).collect(),
            handler_ids: self.handlers.iter().map(|(id, _)| id.clone()).collect(),
        }
    }
}

/// Record of the ids a [`FormatterSet::mount`] call registered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "dropping a MountHandle leaves its entries registered"]
pub struct MountHandle {
    set_name: String,
    formatter_ids: Vec<String>,
    handler_ids: Vec<String>,
}

impl MountHandle {
    pub fn set_name(&self) -> &str {
        &self.set_name
    }
}

impl FormatterRegistry {
    /// Unregister exactly the ids recorded in `handle`.
    pub fn unmount(&mut self, handle: MountHandle) {
        for id in &handle.formatter_ids {
            self.unregister_formatter(id);
        }
        for id in &handle.handler_ids {
            self.unregister_handler(id);
        }
        debug!("Unmounted formatter set '{}'", handle.set_name);
    }
}
