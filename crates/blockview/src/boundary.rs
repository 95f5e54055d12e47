//! Render failure containment.
//!
//! An [`ErrorBoundary`] wraps one rendering unit (usually one block) so a
//! bad configuration or a misbehaving renderer cannot take the whole surface
//! down. It is a two-state machine:
//!
//! ```text
//!            render: Err / panic
//!   Normal ──────────────────────▶ Failed(failure)
//!     ▲                                 │
//!     └────────────── reset() ──────────┘
//! ```
//!
//! While `Failed`, [`render`](ErrorBoundary::render) returns the fallback
//! without running the children again. Every transition into `Failed` is
//! reported to an [`ErrorSink`].

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::RenderError;

/// A contained render failure.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFailure {
    /// What went wrong.
    #[serde(serialize_with = "serialize_error")]
    pub error: RenderError,
    /// Which boundary caught it (usually the block's render key).
    pub context: String,
    /// Stack detail for developers, when a backtrace was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Local>,
}

fn serialize_error<S: serde::Serializer>(err: &RenderError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&err.to_string())
}

/// Destination for render failure reports.
pub trait ErrorSink: Send + Sync {
    fn report(&self, failure: &RenderFailure);
}

/// Reports failures as `tracing` errors.
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, failure: &RenderFailure) {
        error!("[{}] {}", failure.context, failure.error);
        if let Some(detail) = &failure.detail {
            debug!("[{}] stack:\n{detail}", failure.context);
        }
    }
}

/// Boundary state.
#[derive(Debug, Clone)]
pub enum BoundaryState {
    Normal,
    Failed(RenderFailure),
}

/// Contains failures of one rendering unit. See the module docs.
pub struct ErrorBoundary {
    context: String,
    state: BoundaryState,
    sink: Arc<dyn ErrorSink>,
}

impl std::fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("context", &self.context)
            .field("state", &self.state)
            .finish()
    }
}

impl ErrorBoundary {
    /// Create a boundary that reports to [`TracingSink`].
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            state: BoundaryState::Normal,
            sink: Arc::new(TracingSink),
        }
    }

    /// Report to `sink` instead (builder pattern).
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// The contained failure, if any.
    pub fn failure(&self) -> Option<&RenderFailure> {
        match &self.state {
            BoundaryState::Failed(f) => Some(f),
            BoundaryState::Normal => None,
        }
    }

    /// Run `children`, or `fallback` if they fail (or failed earlier).
    ///
    /// Both an `Err` and a panic inside `children` move the boundary to
    /// `Failed`. Panics do not propagate past this call.
    pub fn render<T>(
        &mut self,
        children: impl FnOnce() -> Result<T, RenderError>,
        fallback: impl FnOnce(&RenderFailure) -> T,
    ) -> T {
        if let BoundaryState::Failed(failure) = &self.state {
            return fallback(failure);
        }

        let (error, detail) = match panic::catch_unwind(AssertUnwindSafe(children)) {
            Ok(Ok(output)) => return output,
            Ok(Err(e)) => (e, None),
            Err(payload) => {
                let backtrace = Backtrace::capture();
                let detail = (backtrace.status() == BacktraceStatus::Captured)
                    .then(|| backtrace.to_string());
                (RenderError::Panicked(panic_message(payload.as_ref())), detail)
            }
        };

        let failure = RenderFailure {
            error,
            context: self.context.clone(),
            detail,
            at: Local::now(),
        };
        self.sink.report(&failure);
        let output = fallback(&failure);
        self.state = BoundaryState::Failed(failure);
        output
    }

    /// Clear the failure. The next [`render`](Self::render) runs the children.
    pub fn reset(&mut self) {
        if self.is_failed() {
            debug!("[{}] boundary reset", self.context);
        }
        self.state = BoundaryState::Normal;
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
