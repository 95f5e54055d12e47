//! Run the blockview HTTP harness.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p blockview-web
//! cargo run -p blockview-web -- --port 8080 --static-dir ./frontend/out
//! RUST_LOG=blockview=debug cargo run -p blockview-web -- --strict
//! ```
//!
//! Then, for example:
//!
//! ```bash
//! curl -s localhost:3002/api/surfaces -d '{"presets": true}' -H 'content-type: application/json'
//! curl -s localhost:3002/api/surfaces/1/render -d @result.json -H 'content-type: application/json'
//! ```

use std::path::PathBuf;

use blockview::diagnostics::LogLevel;
use blockview::diagnostics::tracing::DiagnosticsLayer;
use blockview::parser::{DEFAULT_EXCERPT_CHARS, ParserConfig};
use blockview_web::{DEFAULT_MAX_BODY_BYTES, WebConfig, spawn_web};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// HTTP harness for blockview rendering surfaces.
#[derive(Parser)]
#[command(about = "HTTP harness for blockview rendering surfaces")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 3002)]
    port: u16,

    /// Serve a static frontend build from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Validate payloads against the UiOutput JSON Schema.
    #[arg(long)]
    strict: bool,

    /// Characters of raw text quoted when a payload is not valid JSON.
    #[arg(long, default_value_t = DEFAULT_EXCERPT_CHARS)]
    excerpt_chars: usize,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    // Terminal output plus a buffer for GET /api/logs.
    let (diagnostics, log_buffer) = DiagnosticsLayer::with_min_level(LogLevel::Info);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(diagnostics)
        .init();

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
        max_body_bytes: args.max_body_bytes,
        parser: ParserConfig::default()
            .with_excerpt_chars(args.excerpt_chars)
            .with_strict_schema(args.strict),
    };

    let addr = spawn_web(config, Some(log_buffer))
        .await
        .map_err(|e| format!("failed to start harness: {e}"))?;
    println!("Harness: http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for Ctrl-C: {e}"))?;
    println!("Shutting down");
    Ok(())
}
