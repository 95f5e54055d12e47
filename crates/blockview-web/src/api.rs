//! REST API endpoint handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blockview::boundary::TracingSink;
use blockview::diagnostics::tracing::LogBuffer;
use blockview::diagnostics::{CompositeSink, ErrorLog};
use blockview::panel::ErrorPanel;
use blockview::parser::{ParseOutcome, ParserConfig, ResultParser};
use blockview::registry::presets::demo_set;
use blockview::registry::{MountHandle, Row};
use blockview::surface::{RenderResult, Surface, SurfaceConfig, prepare};
use blockview::validate::validate;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// A surface plus the preset mount it was created with.
struct SurfaceEntry {
    surface: Surface,
    presets: Option<MountHandle>,
}

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    parser_config: ParserConfig,
    parser: Arc<ResultParser>,
    surfaces: Arc<Mutex<HashMap<u64, SurfaceEntry>>>,
    next_id: Arc<AtomicU64>,
    errors: ErrorLog,
    logs: Option<LogBuffer>,
}

impl AppState {
    pub fn new(parser_config: ParserConfig, logs: Option<LogBuffer>) -> Self {
        Self {
            parser: Arc::new(ResultParser::new(parser_config.clone())),
            parser_config,
            surfaces: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            errors: ErrorLog::new(),
            logs,
        }
    }

    fn surfaces(&self) -> MutexGuard<'_, HashMap<u64, SurfaceEntry>> {
        self.surfaces.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn panel_response(status: StatusCode, panel: &ErrorPanel) -> Response {
    (status, Json(json!({"status": "error", "panel": panel}))).into_response()
}

// ── Stateless ──────────────────────────────────────────────────────

/// POST /api/parse: Parse an envelope.
///
/// `null` yields `{"status": "pending"}`. A parsed envelope yields its
/// configurations (validated, and normalized when valid) plus dropped-block
/// diagnostics. Envelope-level failures return 422 with an error panel.
pub async fn post_parse(State(app): State<AppState>, Json(envelope): Json<Value>) -> Response {
    match app.parser.parse(Some(&envelope)) {
        Ok(ParseOutcome::Pending) => Json(json!({"status": "pending"})).into_response(),
        Ok(ParseOutcome::Parsed(parsed)) => Json(json!({
            "status": "parsed",
            "configs": prepare(&parsed),
            "summary": parsed.summary,
            "dropped": parsed.dropped,
        }))
        .into_response(),
        Err(e) => panel_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &ErrorPanel::from_parse_error(&e),
        ),
    }
}

/// POST /api/validate: Validate one configuration.
pub async fn post_validate(Json(config): Json<Value>) -> Response {
    Json(validate(Some(&config))).into_response()
}

// ── Surfaces ───────────────────────────────────────────────────────

/// Request body for POST /api/surfaces.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSurfaceRequest {
    /// Mount the demo formatter set.
    pub presets: bool,
    pub skip_invalid: bool,
}

/// POST /api/surfaces: Create a surface. Returns 201 with `{"id": ...}`.
pub async fn create_surface(
    State(app): State<AppState>,
    Json(body): Json<CreateSurfaceRequest>,
) -> Response {
    let sink = CompositeSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::new(app.errors.clone()));
    let mut surface = Surface::new(
        SurfaceConfig::default()
            .with_parser(app.parser_config.clone())
            .with_skip_invalid(body.skip_invalid),
    )
    .with_sink(Arc::new(sink));
    let presets = body.presets.then(|| surface.mount(&demo_set()));

    let id = app.next_id.fetch_add(1, Ordering::Relaxed);
    app.surfaces().insert(id, SurfaceEntry { surface, presets });
    debug!("Surface {id} created (presets: {})", body.presets);
    (StatusCode::CREATED, Json(json!({"id": id}))).into_response()
}

/// DELETE /api/surfaces/{id}: Dispose a surface. 204, or 404 if unknown.
pub async fn delete_surface(State(app): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    match app.surfaces().remove(&id) {
        Some(mut entry) => {
            if let Some(handle) = entry.presets.take() {
                entry.surface.unmount(handle);
            }
            entry.surface.dispose();
            debug!("Surface {id} disposed");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /api/surfaces/{id}/render: Render an envelope through a surface.
///
/// Returns the serialized [`RenderResult`]; rendered output also carries a
/// plain-text `text` preview.
pub async fn render_surface(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Json(envelope): Json<Value>,
) -> Response {
    let mut surfaces = app.surfaces();
    let Some(entry) = surfaces.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let result = entry.surface.render(Some(&envelope));
    drop(surfaces);

    let text = match &result {
        RenderResult::Rendered(out) => Some(out.to_text()),
        _ => None,
    };
    let mut body = serde_json::to_value(&result).unwrap_or_default();
    if let (Some(text), Value::Object(map)) = (text, &mut body) {
        map.insert("text".to_string(), Value::String(text));
    }
    Json(body).into_response()
}

/// POST /api/surfaces/{id}/reset: Reset every boundary of a surface.
pub async fn reset_surface(State(app): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    match app.surfaces().get_mut(&id) {
        Some(entry) => {
            entry.surface.reset();
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Request body for POST /api/surfaces/{id}/click.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    #[serde(default)]
    pub data_type: Option<String>,
    pub row: Row,
}

/// POST /api/surfaces/{id}/click: Dispatch a row click.
///
/// Returns `{"handled": bool}`, or 500 with an error panel when the handler
/// panicked.
pub async fn click_row(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ClickRequest>,
) -> Response {
    let surfaces = app.surfaces();
    let Some(entry) = surfaces.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match entry.surface.click_row(body.data_type.as_deref(), &body.row) {
        Ok(handled) => Json(json!({"handled": handled})).into_response(),
        Err(failure) => panel_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorPanel::from_failure(&failure),
        ),
    }
}

// ── Diagnostics ────────────────────────────────────────────────────

/// GET /api/logs: Drain captured log lines.
pub async fn get_logs(State(app): State<AppState>) -> Response {
    let lines = app.logs.as_ref().map(LogBuffer::drain).unwrap_or_default();
    Json(lines).into_response()
}

/// GET /api/errors: Render failures reported by any surface, oldest first.
pub async fn get_errors(State(app): State<AppState>) -> Response {
    Json(app.errors.reports()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let req: CreateSurfaceRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.presets);
        assert!(!req.skip_invalid);
    }

    #[test]
    fn click_request_deserializes() {
        let json = r#"{"data_type":"products","row":{"name":"Widget"}}"#;
        let req: ClickRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.data_type.as_deref(), Some("products"));
        assert_eq!(req.row["name"], "Widget");

        let req: ClickRequest = serde_json::from_str(r#"{"row":{}}"#).unwrap();
        assert!(req.data_type.is_none());
    }

    #[tokio::test]
    async fn panicking_click_handler_returns_500_panel() {
        let app = AppState::new(ParserConfig::default(), None);
        let mut surface = Surface::default();
        surface
            .registry_mut()
            .register_handler("onRowClick", |_row: &Row| panic!("boom"));
        app.surfaces().insert(7, SurfaceEntry { surface, presets: None });

        let body = ClickRequest {
            data_type: Some("products".into()),
            row: Row::new(),
        };
        let resp = click_row(State(app.clone()), Path(7), Json(body)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["panel"]["title"], "Row action failed");
        assert_eq!(json["panel"]["message"], "Row-click handler panicked: boom");

        assert!(!app.surfaces.is_poisoned());
        assert!(app.surfaces().contains_key(&7));
    }
}
