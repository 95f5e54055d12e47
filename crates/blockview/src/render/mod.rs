//! Renderer dispatch.
//!
//! A [`ComponentRenderer`] turns one normalized configuration into a
//! [`View`]. A [`RendererSet`] maps component kinds to renderers, with an
//! optional fallback for kinds nobody claimed. The crate ships one renderer,
//! [`PreviewRenderer`], which handles every built-in kind well enough for a
//! terminal or a debugging harness.
//!
//! Renderers return `Err` for configurations they cannot draw. They may also
//! panic (usually inside an application formatter); callers that must
//! survive that run them inside an [`ErrorBoundary`](crate::boundary::ErrorBoundary).

mod preview;
mod view;

pub use preview::{PreviewRenderer, field_key, rows_of};
pub use view::{Card, Column, LabeledValue, View, ViewBody, ViewRow};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::component::{ComponentKind, component_of};
use crate::error::RenderError;
use crate::registry::FormatterRegistry;

/// Renders configurations of one or more component kinds.
pub trait ComponentRenderer: Send + Sync {
    /// Kinds this renderer claims when added with [`RendererSet::with`].
    fn kinds(&self) -> Vec<ComponentKind>;

    /// Render a normalized configuration. Formatters are resolved through
    /// `registry`.
    fn render(&self, config: &Value, registry: &FormatterRegistry) -> Result<View, RenderError>;
}

// ── RendererSet ────────────────────────────────────────────────────

/// Component kind → renderer table.
#[derive(Clone, Default)]
pub struct RendererSet {
    renderers: HashMap<ComponentKind, Arc<dyn ComponentRenderer>>,
    fallback: Option<Arc<dyn ComponentRenderer>>,
}

impl fmt::Debug for RendererSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.renderers.keys().map(ComponentKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("RendererSet")
            .field("kinds", &kinds)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl RendererSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with [`PreviewRenderer`] registered for every built-in kind.
    pub fn preview() -> Self {
        Self::new().with(PreviewRenderer)
    }

    /// Register `renderer` for one kind. Replaces any previous renderer.
    pub fn register(&mut self, kind: ComponentKind, renderer: Arc<dyn ComponentRenderer>) {
        trace!("Renderer registered for '{kind}'");
        self.renderers.insert(kind, renderer);
    }

    /// Register a renderer for every kind it claims (builder pattern).
    pub fn with(mut self, renderer: impl ComponentRenderer + 'static) -> Self {
        let renderer: Arc<dyn ComponentRenderer> = Arc::new(renderer);
        for kind in renderer.kinds() {
            self.register(kind, renderer.clone());
        }
        self
    }

    /// Use `renderer` for kinds with no registered renderer (builder pattern).
    pub fn with_fallback(mut self, renderer: impl ComponentRenderer + 'static) -> Self {
        self.fallback = Some(Arc::new(renderer));
        self
    }

    /// The renderer for `kind`, or the fallback.
    pub fn get(&self, kind: &ComponentKind) -> Option<&Arc<dyn ComponentRenderer>> {
        self.renderers.get(kind).or(self.fallback.as_ref())
    }

    /// Number of kinds with a dedicated renderer.
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty() && self.fallback.is_none()
    }

    /// Dispatch `config` on its `component` discriminator.
    ///
    /// `config` should already be normalized; a leftover `"table"` still
    /// resolves to the data-view renderer because [`ComponentKind::parse`]
    /// folds the alias.
    pub fn render(&self, config: &Value, registry: &FormatterRegistry) -> Result<View, RenderError> {
        let kind = component_of(config).ok_or(RenderError::MissingComponent)?;
        let renderer = self
            .get(&kind)
            .ok_or_else(|| RenderError::UnknownComponent(kind.to_string()))?;
        renderer.render(config, registry)
    }
}
