use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::models::{GeneratedResult, GenerationRequest};
use crate::pipeline::{ApiKeyStatus, FailureKind, Orchestrator, PipelineError, StatusSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/status", get(status))
        .route("/api/key", get(key_status))
        .route("/api/key/select", post(select_key))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn failure_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Busy => StatusCode::CONFLICT,
        PipelineError::EmptyProductName => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Generation(failure) => match failure.kind {
            FailureKind::KeyInvalid => StatusCode::UNAUTHORIZED,
            FailureKind::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::EmptyGeneration => StatusCode::BAD_GATEWAY,
            FailureKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// Runs the full two-stage pipeline for one form submission.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Response {
    tracing::info!(product = %request.product_name, "generation requested");
    match state.orchestrator.generate(request).await {
        Ok(result) => Json::<GeneratedResult>(result).into_response(),
        Err(err) => error_response(failure_status(&err), &err.to_string()),
    }
}

/// Progress snapshot the form polls while a run is in flight.
pub async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.orchestrator.status())
}

pub async fn key_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.orchestrator.status().key_status;
    Json(json!({ "status": status }))
}

/// Kicks off the host key-selection flow and reports the re-queried status.
pub async fn select_key(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status: ApiKeyStatus = state.orchestrator.select_key().await;
    Json(json!({ "status": status }))
}
