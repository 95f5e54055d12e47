//! Convenience re-exports for common `blockview` types.
//!
//! ```ignore
//! use blockview::prelude::*;
//! ```
//!
//! Diagnostics types and presets are left out; import those from their
//! modules when needed.

// ── Parsing ─────────────────────────────────────────────────────────
pub use crate::envelope::{ToolResultEnvelope, UiBlock, UiOutput, load_envelope, read_envelope};
pub use crate::error::{LoadError, ParseError, RenderError};
pub use crate::parser::{ParseOutcome, ParsedConfig, ParsedOutput, ParserConfig, ResultParser, parse_envelope};
pub use crate::validate::{ValidationReport, normalize, validate};

// ── Components & rendering ──────────────────────────────────────────
pub use crate::component::ComponentKind;
pub use crate::render::{ComponentRenderer, PreviewRenderer, RendererSet, View, ViewBody};
pub use crate::surface::{BlockOutput, RenderResult, Surface, SurfaceConfig, SurfaceRender};

// ── Registry ────────────────────────────────────────────────────────
pub use crate::registry::{CellValue, FormatterRegistry, FormatterSet, MountHandle, Rendered, Row};

// ── Failure handling ────────────────────────────────────────────────
pub use crate::boundary::{ErrorBoundary, ErrorSink, RenderFailure};
pub use crate::panel::ErrorPanel;
