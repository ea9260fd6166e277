//! Miniature Lab: a two-stage generation pipeline that researches a
//! supplement product into a refined image prompt, then renders it as a
//! hyper-realistic miniature scene via the Gemini generateContent API.

pub mod constants;
pub mod gemini;
pub mod keybridge;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod routes;

pub use gemini::{GeminiClient, GeminiError};
pub use keybridge::{EnvKeyBridge, KeyBridge};
pub use models::{
    AspectRatio, Category, GeneratedResult, GenerationRequest, ImageSize, Resolution,
    WorkerConcept,
};
pub use pipeline::{
    ApiKeyStatus, Failure, FailureKind, GeminiBackend, GenerationBackend, Orchestrator,
    PipelineError,
};
pub use retry::{with_retry, RetryPolicy, RetryableError};
