use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mailroom_core::{ErrorKind, ScanRequest, ScanResponse};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::pipeline::ScanPipeline;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const APP_JS: &str = include_str!("../assets/app.js");

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScanPipeline>,
}

impl AppState {
    pub fn new(pipeline: ScanPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/scan", post(scan_label).fallback(method_not_allowed))
        .route("/api/health", get(health))
        .route("/", get(index))
        .route("/app.js", get(app_js))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /api/scan`
async fn scan_label(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, Response> {
    let Json(request) = payload.map_err(reject)?;
    let outcome = state
        .pipeline
        .scan(request)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;
    Ok(Json(ScanResponse::scanned(outcome.scan_id, outcome.package, outcome.directory)))
}

/// Unreadable request bodies are the caller's fault. Bodies over the size
/// limit keep their 413 but get the same JSON failure body.
fn reject(rejection: JsonRejection) -> Response {
    debug!(error = %rejection, "rejected scan request body");
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let body = ScanResponse::failed(ErrorKind::UserInput, "Image is too large", None);
        return (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response();
    }
    ApiError(ScanResponse::failed(ErrorKind::UserInput, rejection.body_text(), None)).into_response()
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(ErrorKind::MethodNotAllowed, "Use POST")
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "vision_configured": state.pipeline.vision_configured(),
        "directory_configured": state.pipeline.directory_configured(),
    }))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], APP_JS)
}
