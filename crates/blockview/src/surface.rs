//! A rendering surface: parser, registry, renderers, and one error boundary
//! per block, composed into a single `render(envelope)` call.
//!
//! ```text
//! envelope ─▶ ResultParser ─▶ ParsedConfig* ─▶ validate ─┬─ invalid ─▶ ErrorPanel
//!                  │                                    └─ valid ─▶ normalize
//!                  └─ ParseError ─▶ ErrorPanel                         │
//!                                                     ErrorBoundary[key] ─▶ RendererSet ─▶ View
//! ```
//!
//! Surfaces share nothing. Each owns its [`FormatterRegistry`], so two
//! surfaces in one process (or two tests running in parallel) never see each
//! other's formatters. Boundaries are keyed by block render key and persist
//! across `render` calls: a block that failed stays on its fallback until
//! [`Surface::reset`] is called. A boundary whose block is missing from the
//! latest envelope is dropped, so a later block reusing the key starts clean.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::boundary::{ErrorBoundary, ErrorSink, RenderFailure, TracingSink, panic_message};
use crate::component::render_key;
use crate::error::RenderError;
use crate::panel::ErrorPanel;
use crate::parser::{DroppedBlock, ParseOutcome, ParsedOutput, ParserConfig, ResultParser};
use crate::registry::{FormatterRegistry, FormatterSet, MountHandle, ROW_CLICK, Row};
use crate::render::{RendererSet, View};
use crate::validate::{ValidationReport, normalize, validate};

// ── Configuration ──────────────────────────────────────────────────

/// Surface settings.
#[derive(Debug, Clone, Default)]
pub struct SurfaceConfig {
    pub parser: ParserConfig,
    /// Silently drop configurations that fail validation instead of showing
    /// a validation panel in their place. Default: `false`.
    pub skip_invalid: bool,
}

impl SurfaceConfig {
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }
}

// ── Preparation ────────────────────────────────────────────────────

/// A parsed configuration after validation, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedConfig {
    /// Stable render key (config `id`, else its position).
    pub key: String,
    pub block_id: String,
    /// Normalized configuration. Equal to the parsed one when invalid.
    pub config: Value,
    pub validation: ValidationReport,
}

/// Validate every parsed configuration, then normalize the valid ones.
///
/// Validation sees the configuration exactly as the producer wrote it;
/// the `"table"` rewrite happens afterwards.
pub fn prepare(parsed: &ParsedOutput) -> Vec<PreparedConfig> {
    parsed
        .configs
        .iter()
        .enumerate()
        .map(|(index, parsed)| {
            let validation = validate(Some(&parsed.config));
            let config = if validation.is_valid {
                normalize(&parsed.config)
            } else {
                parsed.config.clone()
            };
            PreparedConfig {
                key: render_key(&parsed.config, index),
                block_id: parsed.block_id.clone(),
                config,
                validation,
            }
        })
        .collect()
}

// ── Output ─────────────────────────────────────────────────────────

/// What one block turned into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlockOutput {
    Rendered {
        key: String,
        block_id: String,
        view: View,
    },
    /// The configuration failed validation and was not dispatched.
    Invalid {
        key: String,
        block_id: String,
        panel: ErrorPanel,
    },
    /// The renderer failed (now or on an earlier render) and the block's
    /// boundary is showing its fallback.
    Failed {
        key: String,
        block_id: String,
        panel: ErrorPanel,
    },
}

impl BlockOutput {
    pub fn key(&self) -> &str {
        match self {
            Self::Rendered { key, .. } | Self::Invalid { key, .. } | Self::Failed { key, .. } => key,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        match self {
            Self::Rendered { view, .. } => view.to_text(),
            Self::Invalid { panel, .. } | Self::Failed { panel, .. } => panel.to_text(),
        }
    }
}

/// Every block of one envelope, in block order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceRender {
    pub blocks: Vec<BlockOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub dropped: Vec<DroppedBlock>,
}

impl SurfaceRender {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(summary) = &self.summary {
            out.push_str(&format!("{summary}\n\n"));
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&block.to_text());
        }
        out
    }
}

/// Result of [`Surface::render`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderResult {
    /// No envelope yet.
    Pending,
    /// The envelope could not be decoded at all.
    Error(ErrorPanel),
    Rendered(SurfaceRender),
}

// ── Surface ────────────────────────────────────────────────────────

/// One independent rendering context. See the module docs.
pub struct Surface {
    parser: ResultParser,
    registry: FormatterRegistry,
    renderers: RendererSet,
    boundaries: HashMap<String, ErrorBoundary>,
    sink: Arc<dyn ErrorSink>,
    skip_invalid: bool,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("parser", &self.parser)
            .field("registry", &self.registry)
            .field("renderers", &self.renderers)
            .field("boundaries", &self.boundaries.len())
            .field("skip_invalid", &self.skip_invalid)
            .finish()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl Surface {
    /// Create a surface with an empty registry and the preview renderers.
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            parser: ResultParser::new(config.parser),
            registry: FormatterRegistry::new(),
            renderers: RendererSet::preview(),
            boundaries: HashMap::new(),
            sink: Arc::new(TracingSink),
            skip_invalid: config.skip_invalid,
        }
    }

    /// Replace the renderer table (builder pattern).
    pub fn with_renderers(mut self, renderers: RendererSet) -> Self {
        self.renderers = renderers;
        self
    }

    /// Report boundary failures to `sink` (builder pattern).
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FormatterRegistry {
        &mut self.registry
    }

    /// Mount a formatter set into this surface's registry.
    pub fn mount(&mut self, set: &FormatterSet) -> MountHandle {
        set.mount(&mut self.registry)
    }

    pub fn unmount(&mut self, handle: MountHandle) {
        self.registry.unmount(handle);
    }

    /// Parse, validate, normalize, and render an envelope.
    pub fn render(&mut self, envelope: Option<&Value>) -> RenderResult {
        let parsed = match self.parser.parse(envelope) {
            Ok(ParseOutcome::Pending) => return RenderResult::Pending,
            Ok(ParseOutcome::Parsed(parsed)) => parsed,
            Err(e) => {
                warn!("Envelope rejected: {e}");
                return RenderResult::Error(ErrorPanel::from_parse_error(&e));
            }
        };

        let mut blocks = Vec::with_capacity(parsed.configs.len());
        let mut live = HashSet::with_capacity(parsed.configs.len());
        for prepared in prepare(&parsed) {
            live.insert(prepared.key.clone());
            if !prepared.validation.is_valid {
                if self.skip_invalid {
                    debug!("Skipping invalid config '{}'", prepared.key);
                    continue;
                }
                blocks.push(BlockOutput::Invalid {
                    panel: ErrorPanel::from_validation(&prepared.validation, Some(&prepared.config)),
                    key: prepared.key,
                    block_id: prepared.block_id,
                });
                continue;
            }
            blocks.push(self.render_block(prepared));
        }

        let before = self.boundaries.len();
        self.boundaries.retain(|key, _| live.contains(key));
        if self.boundaries.len() < before {
            debug!("Dropped {} stale boundary(ies)", before - self.boundaries.len());
        }

        info!(
            "Rendered {} block(s), {} dropped",
            blocks.iter().filter(|b| b.is_rendered()).count(),
            parsed.dropped.len()
        );
        RenderResult::Rendered(SurfaceRender {
            blocks,
            summary: parsed.summary,
            dropped: parsed.dropped,
        })
    }

    fn render_block(&mut self, prepared: PreparedConfig) -> BlockOutput {
        let sink = &self.sink;
        let boundary = self
            .boundaries
            .entry(prepared.key.clone())
            .or_insert_with(|| ErrorBoundary::new(prepared.key.clone()).with_sink(sink.clone()));

        let renderers = &self.renderers;
        let registry = &self.registry;
        let config = &prepared.config;
        boundary.render(
            || {
                renderers
                    .render(config, registry)
                    .map(|view| BlockOutput::Rendered {
                        key: prepared.key.clone(),
                        block_id: prepared.block_id.clone(),
                        view,
                    })
            },
            |failure| BlockOutput::Failed {
                key: prepared.key.clone(),
                block_id: prepared.block_id.clone(),
                panel: ErrorPanel::from_failure(failure),
            },
        )
    }

    /// Dispatch a row click to the resolved handler. Returns `Ok(false)` when
    /// no handler applies.
    ///
    /// A panicking handler is contained and reported to the surface's sink.
    pub fn click_row(&self, data_type: Option<&str>, row: &Row) -> Result<bool, RenderFailure> {
        let dispatch = || self.registry.dispatch_row_click(data_type, row);
        match panic::catch_unwind(AssertUnwindSafe(dispatch)) {
            Ok(handled) => Ok(handled),
            Err(payload) => {
                let failure = RenderFailure {
                    error: RenderError::HandlerPanicked(panic_message(payload.as_ref())),
                    context: match data_type {
                        Some(data_type) => format!("{data_type}.{ROW_CLICK}"),
                        None => ROW_CLICK.to_string(),
                    },
                    detail: None,
                    at: Local::now(),
                };
                self.sink.report(&failure);
                Err(failure)
            }
        }
    }

    /// Keys of blocks whose boundary is currently failed.
    pub fn failed_blocks(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .boundaries
            .values()
            .filter(|b| b.is_failed())
            .map(ErrorBoundary::context)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Reset one block's boundary. Returns `false` for an unknown key.
    pub fn reset_block(&mut self, key: &str) -> bool {
        match self.boundaries.get_mut(key) {
            Some(boundary) => {
                boundary.reset();
                true
            }
            None => false,
        }
    }

    /// Reset every boundary. Failed blocks re-render on the next call.
    pub fn reset(&mut self) {
        for boundary in self.boundaries.values_mut() {
            boundary.reset();
        }
    }

    /// Tear down: clear the registry and forget every boundary.
    pub fn dispose(&mut self) {
        self.registry.dispose();
        self.boundaries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use crate::diagnostics::ErrorLog;
    use crate::registry::{CellValue, Rendered};
    use crate::render::ComponentRenderer;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn envelope(configs: &[Value]) -> Value {
        let blocks: Vec<Value> = configs
            .iter()
            .enumerate()
            .map(|(i, c)| json!({"id": format!("b{}", i + 1), "rendering": {"content": c.to_string()}}))
            .collect();
        json!({"structuredContent": {"blocks": blocks, "summary": "s"}})
    }

    fn table() -> Value {
        json!({
            "component": "table",
            "id": "t1",
            "input_data_type": "products",
            "fields": [{"name": "Status", "data_path": "p[*].status", "data": ["active"]}]
        })
    }

    fn rendered(result: RenderResult) -> SurfaceRender {
        match result {
            RenderResult::Rendered(r) => r,
            other => panic!("expected rendered output, got {other:?}"),
        }
    }

    /// Fails while the flag is set.
    struct Flaky(Arc<AtomicBool>);

    impl ComponentRenderer for Flaky {
        fn kinds(&self) -> Vec<ComponentKind> {
            vec![ComponentKind::Image]
        }

        fn render(&self, _: &Value, _: &FormatterRegistry) -> Result<View, RenderError> {
            if self.0.load(Ordering::SeqCst) {
                Err(RenderError::failed("image", "decoder unavailable"))
            } else {
                Ok(View::summary(ComponentKind::Image, None, "ok"))
            }
        }
    }

    #[test]
    fn null_envelope_is_pending() {
        assert_eq!(Surface::default().render(None), RenderResult::Pending);
        assert_eq!(
            Surface::default().render(Some(&Value::Null)),
            RenderResult::Pending
        );
    }

    #[test]
    fn envelope_failure_becomes_panel() {
        let result = Surface::default().render(Some(&json!({})));
        let RenderResult::Error(panel) = result else {
            panic!("expected an error panel");
        };
        assert_eq!(panel.message, "No data in tool result");
    }

    #[test]
    fn table_is_normalized_before_dispatch() {
        let mut surface = Surface::default();
        surface
            .registry_mut()
            .register_formatter("status", |v: &CellValue| Rendered::text(v.to_string().to_uppercase()));
        let out = rendered(surface.render(Some(&envelope(&[table()]))));
        assert_eq!(out.summary.as_deref(), Some("s"));
        let BlockOutput::Rendered { key, view, .. } = &out.blocks[0] else {
            panic!("expected a rendered block");
        };
        assert_eq!(key, "t1");
        assert_eq!(view.component, ComponentKind::DataView);
        assert!(view.to_text().contains("ACTIVE"));
    }

    #[test]
    fn prepare_validates_before_normalizing() {
        let parsed = ParsedOutput {
            configs: vec![
                crate::parser::ParsedConfig {
                    block_id: "b1".into(),
                    block_index: 0,
                    config: json!({"component": "table"}),
                },
                crate::parser::ParsedConfig {
                    block_id: "b2".into(),
                    block_index: 1,
                    config: json!({}),
                },
            ],
            ..Default::default()
        };
        let prepared = prepare(&parsed);
        assert_eq!(prepared[0].config, json!({"component": "data-view"}));
        assert_eq!(prepared[0].key, "#0");
        assert!(!prepared[1].validation.is_valid);
        assert_eq!(prepared[1].key, "#1");
    }

    #[test]
    fn invalid_configs_show_a_panel_or_are_skipped() {
        let env = envelope(&[json!({"title": "no definition"}), table()]);

        let out = rendered(Surface::default().render(Some(&env)));
        assert_eq!(out.blocks.len(), 2);
        let BlockOutput::Invalid { panel, .. } = &out.blocks[0] else {
            panic!("expected an invalid block");
        };
        assert_eq!(panel.bullets, vec!["Config missing required component definition"]);
        assert!(out.blocks[1].is_rendered());

        let mut skipping = Surface::new(SurfaceConfig::default().with_skip_invalid(true));
        let out = rendered(skipping.render(Some(&env)));
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].key(), "t1");
    }

    #[test]
    fn failing_block_does_not_affect_siblings_and_stays_failed_until_reset() {
        let failing = Arc::new(AtomicBool::new(true));
        let log = ErrorLog::new();
        let mut surface = Surface::default()
            .with_renderers(RendererSet::preview().with(Flaky(failing.clone())))
            .with_sink(Arc::new(log.clone()));
        let env = envelope(&[json!({"component": "image", "id": "img"}), table()]);

        let out = rendered(surface.render(Some(&env)));
        assert!(matches!(out.blocks[0], BlockOutput::Failed { .. }));
        assert!(out.blocks[1].is_rendered());
        assert_eq!(surface.failed_blocks(), vec!["img"]);
        assert_eq!(log.len(), 1);

        // Fixed renderer, but the boundary holds until reset.
        failing.store(false, Ordering::SeqCst);
        let out = rendered(surface.render(Some(&env)));
        assert!(matches!(out.blocks[0], BlockOutput::Failed { .. }));
        assert_eq!(log.len(), 1);

        assert!(surface.reset_block("img"));
        assert!(!surface.reset_block("nope"));
        let out = rendered(surface.render(Some(&env)));
        assert!(out.blocks.iter().all(BlockOutput::is_rendered));
    }

    #[test]
    fn boundaries_follow_the_latest_envelope() {
        let mut surface = Surface::default();
        for i in 0..50 {
            let env = envelope(&[json!({"component": "image", "id": format!("img{i}"), "url": "a.png"})]);
            let _ = surface.render(Some(&env));
        }
        assert_eq!(surface.boundaries.len(), 1);
        assert!(surface.boundaries.contains_key("img49"));
    }

    #[test]
    fn positional_failure_does_not_leak_into_a_new_envelope() {
        let mut surface = Surface::default();
        let out = rendered(surface.render(Some(&envelope(&[json!({"component": "gauge"})]))));
        assert!(matches!(out.blocks[0], BlockOutput::Failed { .. }));
        assert_eq!(surface.failed_blocks(), vec!["#0"]);

        // Same positional key, unrelated block: it renders.
        let out = rendered(surface.render(Some(&envelope(&[json!({"component": "image", "url": "cat.png"})]))));
        assert!(out.blocks[0].is_rendered());
        assert_eq!(out.blocks[0].to_text(), "Image: cat.png\n");
        assert!(surface.failed_blocks().is_empty());
    }

    #[test]
    fn pending_envelope_keeps_boundaries() {
        let mut surface = Surface::default();
        let _ = surface.render(Some(&envelope(&[json!({"component": "gauge", "id": "g"})])));
        assert_eq!(surface.render(None), RenderResult::Pending);
        assert_eq!(surface.failed_blocks(), vec!["g"]);
    }

    #[test]
    fn panicking_renderer_is_contained() {
        struct Explodes;
        impl ComponentRenderer for Explodes {
            fn kinds(&self) -> Vec<ComponentKind> {
                vec![ComponentKind::Chart]
            }
            fn render(&self, _: &Value, _: &FormatterRegistry) -> Result<View, RenderError> {
                panic!("chart exploded")
            }
        }

        let mut surface =
            Surface::default().with_renderers(RendererSet::preview().with(Explodes));
        let out = rendered(surface.render(Some(&envelope(&[json!({"component": "chart"})]))));
        let BlockOutput::Failed { panel, .. } = &out.blocks[0] else {
            panic!("expected a failed block");
        };
        assert_eq!(panel.message, "Renderer panicked: chart exploded");
    }

    #[test]
    fn unknown_kind_fails_only_its_block() {
        let mut surface = Surface::default();
        let out = rendered(surface.render(Some(&envelope(&[json!({"component": "gauge"}), table()]))));
        let BlockOutput::Failed { panel, .. } = &out.blocks[0] else {
            panic!("expected a failed block");
        };
        assert_eq!(panel.message, "No renderer registered for component 'gauge'");
        assert!(out.blocks[1].is_rendered());
    }

    #[test]
    fn surfaces_do_not_share_formatters() {
        let mut a = Surface::default();
        let b = Surface::default();
        let handle = a.mount(&crate::registry::presets::demo_set());
        assert!(a.registry().get_formatter("status").is_some());
        assert!(b.registry().get_formatter("status").is_none());

        a.unmount(handle);
        assert!(a.registry().is_empty());
    }

    #[test]
    fn row_clicks_reach_the_surface_registry() {
        let clicked = Arc::new(AtomicBool::new(false));
        let mut surface = Surface::default();
        let c = clicked.clone();
        surface
            .registry_mut()
            .register_handler("products.onRowClick", move |_row: &Row| c.store(true, Ordering::SeqCst));

        assert!(matches!(surface.click_row(Some("orders"), &Row::new()), Ok(false)));
        assert!(matches!(surface.click_row(Some("products"), &Row::new()), Ok(true)));
        assert!(clicked.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_row_handler_is_contained_and_reported() {
        let log = ErrorLog::new();
        let mut surface = Surface::default().with_sink(Arc::new(log.clone()));
        surface
            .registry_mut()
            .register_handler("products.onRowClick", |_row: &Row| panic!("handler exploded"));

        let failure = surface.click_row(Some("products"), &Row::new()).unwrap_err();
        assert_eq!(failure.context, "products.onRowClick");
        assert_eq!(failure.error.to_string(), "Row-click handler panicked: handler exploded");
        assert_eq!(log.len(), 1);

        let panel = ErrorPanel::from_failure(&failure);
        assert_eq!(panel.title, "Row action failed");

        // The registry is still usable afterwards.
        assert!(matches!(surface.click_row(Some("orders"), &Row::new()), Ok(false)));
    }

    #[test]
    fn dispose_clears_registry_and_boundaries() {
        let mut surface = Surface::default();
        let _handle = surface.mount(&crate::registry::presets::demo_set());
        let _ = surface.render(Some(&envelope(&[json!({"component": "gauge"})])));
        assert_eq!(surface.failed_blocks().len(), 1);

        surface.dispose();
        assert!(surface.registry().is_empty());
        assert!(surface.failed_blocks().is_empty());
    }

    #[test]
    fn render_result_serializes_with_status() {
        let value = serde_json::to_value(RenderResult::Pending).unwrap();
        assert_eq!(value, json!({"status": "pending"}));

        let out = Surface::default().render(Some(&envelope(&[table()])));
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["status"], "rendered");
        assert_eq!(value["blocks"][0]["status"], "rendered");
        assert_eq!(value["blocks"][0]["view"]["component"], "data-view");
    }
}
