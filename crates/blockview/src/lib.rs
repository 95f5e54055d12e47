//! Parse, validate, and dispatch agent-produced UI component configurations.
//!
//! An agent tool returns a *tool-result envelope*: JSON that somewhere
//! contains a list of blocks, each carrying a component configuration (a
//! card, a table, a chart, ...) as a JSON string. `blockview` turns that
//! envelope into configurations a renderer can draw, lets the embedding
//! application customize individual fields through a formatter registry, and
//! keeps one misbehaving block from taking the whole surface down.
//!
//! # Getting started
//!
//! ```
//! use blockview::prelude::*;
//! use serde_json::json;
//!
//! let envelope = json!({
//!     "content": [{
//!         "type": "text",
//!         "text": r#"{"blocks":[{"id":"b1","rendering":{"content":"{\"component\":\"table\",\"id\":\"t1\"}"}}],"summary":"s"}"#
//!     }]
//! });
//!
//! // Parse the envelope; bad blocks are dropped, not fatal.
//! let parsed = parse_envelope(Some(&envelope)).unwrap().parsed().unwrap();
//! assert_eq!(parsed.summary.as_deref(), Some("s"));
//!
//! // Validate on the original form, normalize right before dispatch.
//! let config = &parsed.configs[0].config;
//! assert!(validate(Some(config)).is_valid);
//! assert_eq!(normalize(config), json!({"component": "data-view", "id": "t1"}));
//! ```
//!
//! A [`Surface`](surface::Surface) does all of the above in one call and
//! renders each block inside its own [`ErrorBoundary`](boundary::ErrorBoundary):
//!
//! ```
//! use blockview::prelude::*;
//! use serde_json::json;
//!
//! let mut surface = Surface::new(SurfaceConfig::default());
//! let _demo = surface.mount(&blockview::registry::presets::demo_set());
//!
//! let envelope = json!({"structuredContent": {"blocks": [
//!     {"id": "b1", "rendering": {"content": "{\"component\":\"image\",\"url\":\"cat.png\"}"}}
//! ]}});
//! match surface.render(Some(&envelope)) {
//!     RenderResult::Rendered(out) => assert_eq!(out.to_text(), "Image: cat.png\n"),
//!     other => panic!("{other:?}"),
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`envelope`] | Envelope and `UiOutput` wire types, JSON Schema export, file loading |
//! | [`parser`] | [`ResultParser`](parser::ResultParser): envelope → configurations, per-block drop diagnostics |
//! | [`validate`] | Structural validation and `"table"` → `"data-view"` normalization |
//! | [`component`] | [`ComponentKind`](component::ComponentKind) and config field helpers |
//! | [`registry`] | Per-surface formatter and row-click handler registry, formatter sets, presets |
//! | [`render`] | [`ComponentRenderer`](render::ComponentRenderer) trait, [`RendererSet`](render::RendererSet), preview renderer |
//! | [`boundary`] | Two-state [`ErrorBoundary`](boundary::ErrorBoundary) and error sinks |
//! | [`surface`] | [`Surface`](surface::Surface): the whole pipeline for one rendering context |
//! | [`panel`] | [`ErrorPanel`](panel::ErrorPanel), the user-visible end of every error path |
//! | [`diagnostics`] | Captured log lines and render failure logs for developer panels |

pub mod boundary;
pub mod component;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod panel;
pub mod parser;
pub mod prelude;
pub mod registry;
pub mod render;
pub mod surface;
pub mod validate;

// Re-export schemars for downstream crates deriving schemas next to ours.
pub use schemars;
