//! Tracing layer that captures log events into a [`LogBuffer`].
//!
//! Harnesses install [`DiagnosticsLayer`] next to their normal subscriber
//! layers and drain the buffer whenever they want to show what the parser
//! and renderers logged (dropped blocks, replaced formatters, contained
//! failures). The buffer has its own mutex and never touches surface state.

use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::Subscriber;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::registry::LookupSpan;

use super::{LOG_TRIM_TO, LogLevel, LogLine, MAX_LOG_LINES};

/// A shared buffer of pending log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<LogLine>>>);

impl LogBuffer {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::with_capacity(128))))
    }

    /// Drain all pending log lines from the buffer, returning them.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }

    /// Number of pending lines.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, line: LogLine) {
        if let Ok(mut buf) = self.0.lock() {
            buf.push(line);
            // Cap the buffer so a burst of logs before the next drain
            // doesn't consume unbounded memory.
            if buf.len() > MAX_LOG_LINES {
                let trim_to = buf.len() - LOG_TRIM_TO;
                buf.drain(..trim_to);
            }
        }
    }
}

/// A [`tracing_subscriber::Layer`] that records events at or above a
/// minimum level into a [`LogBuffer`].
pub struct DiagnosticsLayer {
    buffer: LogBuffer,
    min_level: LogLevel,
}

impl DiagnosticsLayer {
    /// Create a layer capturing `DEBUG` and above, plus its buffer.
    pub fn new() -> (Self, LogBuffer) {
        Self::with_min_level(LogLevel::Debug)
    }

    /// Create a layer capturing `min_level` and above, plus its buffer.
    pub fn with_min_level(min_level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::new();
        (
            Self {
                buffer: buffer.clone(),
                min_level,
            },
            buffer,
        )
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for DiagnosticsLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = LogLevel::from(event.metadata().level());
        if level < self.min_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message;
        if !visitor.fields.is_empty() {
            let extras: Vec<String> = visitor
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            if message.is_empty() {
                message = extras.join(" ");
            } else {
                message = format!("{message} {{{}}}", extras.join(", "));
            }
        }

        self.buffer.push(LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            level,
            target: event.metadata().target().to_string(),
            message,
        });
    }
}

/// Visitor that extracts the message and extra fields from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let raw = format!("{value:?}");
            self.message = raw
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .map(str::to_string)
                .unwrap_or(raw);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn captures_messages_and_fields() {
        let (layer, buffer) = DiagnosticsLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Dropping block b2");
            tracing::info!(block = "b3", "Rendered");
            tracing::trace!("too quiet to keep");
        });

        let lines = buffer.drain();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, LogLevel::Warn);
        assert_eq!(lines[0].message, "Dropping block b2");
        assert_eq!(lines[1].message, "Rendered {block=b3}");
        assert!(buffer.is_empty());
    }

    #[test]
    fn min_level_filters() {
        let (layer, buffer) = DiagnosticsLayer::with_min_level(LogLevel::Warn);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("ignored");
            tracing::error!("kept");
        });
        let lines = buffer.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, LogLevel::Error);
    }

    #[test]
    fn parser_warnings_are_captured() {
        let (layer, buffer) = DiagnosticsLayer::with_min_level(LogLevel::Warn);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let envelope = serde_json::json!({
                "structuredContent": {"blocks": [
                    {"id": "bad", "rendering": {"content": "{nope"}}
                ]}
            });
            let _ = crate::parser::parse_envelope(Some(&envelope));
        });
        let lines = buffer.drain();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].message.contains("Dropping block bad"));
        assert!(lines[0].target.starts_with("blockview"));
    }
}
