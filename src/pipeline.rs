//! Pipeline orchestrator: sequences prompt refinement into image
//! generation, owns the UI-observable state, and classifies failures.

use crate::constants::messages;
use crate::gemini::{GeminiClient, GeminiError};
use crate::keybridge::KeyBridge;
use crate::models::{AspectRatio, GeneratedResult, GenerationRequest, ImageSize};
use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Unknown,
    Absent,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    KeyInvalid,
    Overloaded,
    EmptyGeneration,
    Other,
}

/// A classified pipeline failure with its user-facing message.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// One run at a time; the submit control is disabled while loading.
    #[error("이미 생성이 진행 중입니다.")]
    Busy,
    #[error("제품명을 입력해주세요.")]
    EmptyProductName,
    #[error("{}", .0.message)]
    Generation(Failure),
}

/// The two remote stages behind a seam so the orchestrator can be driven by
/// deterministic fakes in tests.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn refine_prompt(&self, request: &GenerationRequest) -> Result<String, GeminiError>;
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        size: ImageSize,
    ) -> Result<String, GeminiError>;
}

/// Production backend. Builds a fresh [`GeminiClient`] per stage call,
/// re-reading the credential each time so a reselected key takes effect
/// without explicit invalidation.
#[derive(Default)]
pub struct GeminiBackend {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Fixed key instead of the `GEMINI_API_KEY` lookup, for tests.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn client(&self) -> Result<GeminiClient, GeminiError> {
        let key = match &self.api_key {
            Some(key) => key.clone(),
            None => std::env::var("GEMINI_API_KEY").map_err(|_| GeminiError::MissingApiKey)?,
        };
        Ok(match &self.base_url {
            Some(url) => GeminiClient::with_base_url(key, url.clone()),
            None => GeminiClient::new(key),
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn refine_prompt(&self, request: &GenerationRequest) -> Result<String, GeminiError> {
        self.client()?.refine_prompt(request).await
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        size: ImageSize,
    ) -> Result<String, GeminiError> {
        self.client()?.generate_image(prompt, aspect_ratio, size).await
    }
}

#[derive(Debug)]
struct PipelineState {
    loading: bool,
    retry_count: u32,
    result: Option<GeneratedResult>,
    error: Option<String>,
    key_status: ApiKeyStatus,
}

/// Snapshot of the observable state for the form's progress display.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub loading: bool,
    pub retry_count: u32,
    pub key_status: ApiKeyStatus,
    pub error: Option<String>,
}

pub struct Orchestrator {
    state: RwLock<PipelineState>,
    backend: Arc<dyn GenerationBackend>,
    bridge: Arc<dyn KeyBridge>,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>, bridge: Arc<dyn KeyBridge>) -> Self {
        Self {
            state: RwLock::new(PipelineState {
                loading: false,
                retry_count: 0,
                result: None,
                error: None,
                key_status: ApiKeyStatus::Unknown,
            }),
            backend,
            bridge,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Queries the key bridge once at startup.
    pub async fn init_key_status(&self) -> ApiKeyStatus {
        let status = self.query_bridge().await;
        self.state.write().key_status = status;
        status
    }

    /// Runs the host's key-selection flow, then re-queries the bridge
    /// rather than assuming the flow actually set a key.
    pub async fn select_key(&self) -> ApiKeyStatus {
        self.bridge.open_select_key().await;
        let status = self.query_bridge().await;
        self.state.write().key_status = status;
        status
    }

    async fn query_bridge(&self) -> ApiKeyStatus {
        if self.bridge.has_selected_api_key().await {
            ApiKeyStatus::Present
        } else {
            ApiKeyStatus::Absent
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        let state = self.state.read();
        StatusSnapshot {
            loading: state.loading,
            retry_count: state.retry_count,
            key_status: state.key_status,
            error: state.error.clone(),
        }
    }

    pub fn last_result(&self) -> Option<GeneratedResult> {
        self.state.read().result.clone()
    }

    /// Runs the full pipeline for one submission. Exactly one run may be in
    /// flight; a failed run leaves any previous result in place.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GeneratedResult, PipelineError> {
        if request.product_name.trim().is_empty() {
            return Err(PipelineError::EmptyProductName);
        }
        {
            let mut state = self.state.write();
            if state.loading {
                return Err(PipelineError::Busy);
            }
            state.loading = true;
            state.error = None;
            state.retry_count = 0;
        }

        let outcome = self.run_stages(&request).await;

        let mut state = self.state.write();
        state.loading = false;
        state.retry_count = 0;
        match outcome {
            Ok(result) => {
                info!(product = %request.product_name, "generation succeeded");
                state.result = Some(result.clone());
                Ok(result)
            }
            Err(err) => {
                let failure = classify(&err);
                error!(kind = ?failure.kind, "generation failed: {err}");
                if failure.kind == FailureKind::KeyInvalid {
                    state.key_status = ApiKeyStatus::Absent;
                }
                state.error = Some(failure.message.clone());
                Err(PipelineError::Generation(failure))
            }
        }
    }

    async fn run_stages(&self, request: &GenerationRequest) -> Result<GeneratedResult, GeminiError> {
        let prompt = with_retry(
            &self.retry,
            || self.backend.refine_prompt(request),
            |attempt| self.note_retry(attempt),
        )
        .await?;

        let size = request.resolution.resolve();
        let image_url = with_retry(
            &self.retry,
            || self.backend.generate_image(&prompt, request.aspect_ratio, size),
            |attempt| self.note_retry(attempt),
        )
        .await?;

        Ok(GeneratedResult {
            image_url,
            prompt,
            generated_at: Utc::now(),
        })
    }

    fn note_retry(&self, attempt: u32) {
        self.state.write().retry_count = attempt;
    }
}

/// Single point of failure classification. Matches the remote service's
/// message patterns case-sensitively.
fn classify(err: &GeminiError) -> Failure {
    let message = err.to_string();
    if matches!(err, GeminiError::MissingApiKey)
        || message.contains("Requested entity was not found")
    {
        return Failure {
            kind: FailureKind::KeyInvalid,
            message: messages::KEY_INVALID.to_string(),
        };
    }
    if matches!(err, GeminiError::EmptyGeneration) {
        return Failure {
            kind: FailureKind::EmptyGeneration,
            message: messages::EMPTY_GENERATION.to_string(),
        };
    }
    if crate::retry::RetryableError::is_transient(err) {
        return Failure {
            kind: FailureKind::Overloaded,
            message: messages::OVERLOADED.to_string(),
        };
    }
    Failure {
        kind: FailureKind::Other,
        message: if message.is_empty() {
            messages::GENERIC.to_string()
        } else {
            message
        },
    }
}
