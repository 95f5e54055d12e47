//! Developer-facing diagnostics: captured log lines and render failure logs.
//!
//! Nothing here affects parsing or rendering. Harnesses use these types to
//! show "what happened" panels next to the rendered output.

pub mod tracing;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::boundary::{ErrorSink, RenderFailure};

/// Maximum log lines (or error reports) kept in memory.
pub const MAX_LOG_LINES: usize = 2000;
/// Trim to this many when the cap is exceeded.
pub const LOG_TRIM_TO: usize = 1200;

/// A single log line captured from tracing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}: {}", self.time, self.level.label(), self.target, self.message)
    }
}

/// Log severity level (mirrors tracing levels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short fixed-width label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

impl From<&::tracing::Level> for LogLevel {
    fn from(level: &::tracing::Level) -> Self {
        match *level {
            ::tracing::Level::TRACE => Self::Trace,
            ::tracing::Level::DEBUG => Self::Debug,
            ::tracing::Level::INFO => Self::Info,
            ::tracing::Level::WARN => Self::Warn,
            ::tracing::Level::ERROR => Self::Error,
        }
    }
}

/// One entry in an [`ErrorLog`].
#[derive(Clone, Debug, Serialize)]
pub struct ErrorReport {
    pub at: DateTime<Local>,
    pub context: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An [`ErrorSink`] that keeps the most recent render failures in memory.
///
/// Cloning shares the underlying log.
#[derive(Clone, Default)]
pub struct ErrorLog(Arc<Mutex<Vec<ErrorReport>>>);

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every retained report, oldest first.
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Remove and return every retained report.
    pub fn drain(&self) -> Vec<ErrorReport> {
        let mut reports = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *reports)
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for ErrorLog {
    fn report(&self, failure: &RenderFailure) {
        let mut reports = self.0.lock().unwrap_or_else(|e| e.into_inner());
        reports.push(ErrorReport {
            at: failure.at,
            context: failure.context.clone(),
            message: failure.error.to_string(),
            detail: failure.detail.clone(),
        });
        if reports.len() > MAX_LOG_LINES {
            let trim_to = reports.len() - LOG_TRIM_TO;
            reports.drain(..trim_to);
        }
    }
}

/// Fans a report out to several sinks in order.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn ErrorSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the chain (builder pattern).
    pub fn with(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ErrorSink for CompositeSink {
    fn report(&self, failure: &RenderFailure) {
        for sink in &self.sinks {
            sink.report(failure);
        }
    }
}
