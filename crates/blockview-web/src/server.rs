//! Axum server setup and router construction.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use blockview::diagnostics::tracing::LogBuffer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::WebConfig;
use crate::api::{self, AppState};

/// Build the full axum router.
pub fn build_router(config: &WebConfig, log_buffer: Option<LogBuffer>) -> Router {
    let app_state = AppState::new(config.parser.clone(), log_buffer);

    // CORS layer for development (frontend dev server on a different port).
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/api/parse", post(api::post_parse))
        .route("/api/validate", post(api::post_validate))
        .route("/api/surfaces", post(api::create_surface))
        .route("/api/surfaces/{id}", delete(api::delete_surface))
        .route("/api/surfaces/{id}/render", post(api::render_surface))
        .route("/api/surfaces/{id}/reset", post(api::reset_surface))
        .route("/api/surfaces/{id}/click", post(api::click_row))
        .route("/api/logs", get(api::get_logs))
        .route("/api/errors", get(api::get_errors))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors);

    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Bind `bind_addr`, serve `router` on a background task, and return the
/// bound address (useful with port 0).
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("Harness listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Harness server stopped: {e}");
        }
    });

    Ok(addr)
}
