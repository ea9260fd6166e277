//! HTTP surface tests driving the router directly.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use miniature_lab::gemini::GeminiError;
use miniature_lab::keybridge::KeyBridge;
use miniature_lab::models::{AspectRatio, GenerationRequest, ImageSize};
use miniature_lab::pipeline::{GenerationBackend, Orchestrator};
use miniature_lab::routes::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Backend whose image stage always reports an empty generation; the
/// refinement stage succeeds.
struct EmptyImageBackend;

#[async_trait]
impl GenerationBackend for EmptyImageBackend {
    async fn refine_prompt(&self, _request: &GenerationRequest) -> Result<String, GeminiError> {
        Ok("a refined prompt".to_string())
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _aspect_ratio: AspectRatio,
        _size: ImageSize,
    ) -> Result<String, GeminiError> {
        Err(GeminiError::EmptyGeneration)
    }
}

/// Backend that must never be reached.
struct UnreachableBackend;

#[async_trait]
impl GenerationBackend for UnreachableBackend {
    async fn refine_prompt(&self, _request: &GenerationRequest) -> Result<String, GeminiError> {
        panic!("pipeline must not start");
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _aspect_ratio: AspectRatio,
        _size: ImageSize,
    ) -> Result<String, GeminiError> {
        panic!("pipeline must not start");
    }
}

struct SelectedBridge;

#[async_trait]
impl KeyBridge for SelectedBridge {
    async fn has_selected_api_key(&self) -> bool {
        true
    }

    async fn open_select_key(&self) {}
}

fn app(backend: Arc<dyn GenerationBackend>) -> axum::Router {
    let orchestrator = Arc::new(Orchestrator::new(backend, Arc::new(SelectedBridge)));
    router(AppState { orchestrator })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn blank_product_name_is_rejected_before_the_pipeline_starts() {
    let app = app(Arc::new(UnreachableBackend));

    let request = post_json(
        "/api/generate",
        json!({
            "category": "Vegetable",
            "product_name": "   ",
            "worker_concept": "Chef",
            "aspect_ratio": "1:1",
            "resolution": "Auto"
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn empty_generation_maps_to_bad_gateway_with_localized_message() {
    let app = app(Arc::new(EmptyImageBackend));

    let request = post_json(
        "/api/generate",
        json!({
            "category": "Seafood",
            "product_name": "바이오메가",
            "worker_concept": "Farmer",
            "aspect_ratio": "9:16",
            "resolution": "4K"
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "이미지가 생성되지 않았습니다.");
}

#[tokio::test]
async fn status_endpoint_reports_idle_state() {
    let app = app(Arc::new(UnreachableBackend));

    let request = Request::builder()
        .uri("/api/status")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["loading"], false);
    assert_eq!(body["retry_count"], 0);
    assert_eq!(body["key_status"], "unknown");
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn select_key_reports_requeried_status() {
    let app = app(Arc::new(UnreachableBackend));

    let response = app
        .oneshot(post_json("/api/key/select", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "present");
}
