//! HTTP test harness for `blockview` rendering surfaces.
//!
//! `blockview-web` exposes the parser, the validator, and independent
//! [`Surface`](blockview::surface::Surface)s over a small REST API so a
//! browser frontend (or `curl`) can exercise them without linking Rust.
//!
//! # Quick start
//!
//! ```ignore
//! use blockview_web::{WebConfig, spawn_web};
//!
//! let addr = spawn_web(WebConfig::default(), None).await?;
//! println!("Harness: http://{addr}");
//! ```
//!
//! # Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/parse` | Parse an envelope; configs come back validated and normalized |
//! | `POST /api/validate` | Validate one configuration |
//! | `POST /api/surfaces` | Create a surface (own registry and boundaries) |
//! | `DELETE /api/surfaces/{id}` | Dispose a surface |
//! | `POST /api/surfaces/{id}/render` | Render an envelope through a surface |
//! | `POST /api/surfaces/{id}/reset` | Reset a surface's error boundaries |
//! | `POST /api/surfaces/{id}/click` | Dispatch a row click |
//! | `GET /api/logs` | Drain captured log lines |
//! | `GET /api/errors` | Render failures reported by any surface |

mod api;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use blockview::diagnostics::tracing::LogBuffer;
use blockview::parser::ParserConfig;

/// Default request body cap (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for the harness server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3002`.
    pub bind_addr: SocketAddr,
    /// Directory of a static frontend build to serve at `/`.
    ///
    /// If `None`, only the API is served.
    pub static_dir: Option<PathBuf>,
    /// Maximum request body size. Default: [`DEFAULT_MAX_BODY_BYTES`].
    pub max_body_bytes: usize,
    /// Parser settings for `/api/parse` and new surfaces.
    pub parser: ParserConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3002)),
            static_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            parser: ParserConfig::default(),
        }
    }
}

/// Spawn the harness server on a Tokio task and return the bound address.
///
/// `log_buffer` is the buffer of a
/// [`DiagnosticsLayer`](blockview::diagnostics::tracing::DiagnosticsLayer)
/// installed by the caller; `GET /api/logs` drains it. Without one the
/// route returns an empty list.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(
    config: WebConfig,
    log_buffer: Option<LogBuffer>,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(&config, log_buffer);
    server::start_server(router, config.bind_addr).await
}
