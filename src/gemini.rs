//! Client for the Gemini generateContent API and the two pipeline stages:
//! grounded prompt refinement and image generation.

use crate::constants::{self, SYSTEM_INSTRUCTION};
use crate::models::{AspectRatio, GenerationRequest, ImageSize};
use crate::retry::RetryableError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

pub const TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API key is missing. Set GEMINI_API_KEY or select a key first.")]
    MissingApiKey,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse API response: {0}")]
    Parse(String),
    #[error("이미지가 생성되지 않았습니다.")]
    EmptyGeneration,
}

impl RetryableError for GeminiError {
    /// Transient-overload signal: HTTP 503, or the error text carrying
    /// "503" or "overloaded". Substring matches are case-sensitive.
    fn is_transient(&self) -> bool {
        if let GeminiError::Http { status: 503, .. } = self {
            return true;
        }
        let message = self.to_string();
        message.contains("503") || message.contains("overloaded")
    }
}

/// Thin client over the generateContent endpoint. Cheap to construct: the
/// pipeline builds a fresh one (with a fresh credential read) per stage call
/// so a reselected key is picked up without invalidation logic.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::with_base_url(api_key, base_url)
    }

    /// Client against a custom endpoint, used by tests to point at a mock
    /// server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Stage one: grounded refinement of the product description into an
    /// image prompt. Returns the response's first text part, or a
    /// deterministic fallback when the model produced no text. Only the
    /// transport can fail this stage.
    pub async fn refine_prompt(&self, request: &GenerationRequest) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": constants::research_instruction(request) }]
            }],
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "tools": [{ "googleSearch": {} }]
        });

        info!(product = %request.product_name, "refining prompt via {TEXT_MODEL}");
        let response = self.generate_content(TEXT_MODEL, &body).await?;
        let prompt = refined_or_fallback(&response, &request.product_name);
        debug!("refined prompt: {}", preview(&prompt));
        Ok(prompt)
    }

    /// Stage two: turn the refined prompt into an image. Returns a
    /// self-contained data URI, or [`GeminiError::EmptyGeneration`] when no
    /// part of the first candidate carries inlined image bytes.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        size: ImageSize,
    ) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "imageConfig": {
                    "aspectRatio": aspect_ratio.as_str(),
                    "imageSize": size.as_str()
                }
            }
        });

        info!(
            aspect_ratio = aspect_ratio.as_str(),
            size = size.as_str(),
            "generating image via {IMAGE_MODEL}"
        );
        let response = self.generate_content(IMAGE_MODEL, &body).await?;
        match first_inline_image(&response) {
            Some(data) => {
                info!("extracted inline image ({} base64 chars)", data.len());
                Ok(format!("data:image/png;base64,{data}"))
            }
            None => {
                error!("response carried no inline image data");
                Err(GeminiError::EmptyGeneration)
            }
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        debug!("POST {}", url.replace(&self.api_key, "***"));

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(%status, "generateContent failed: {}", preview(&text));
            return Err(GeminiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| GeminiError::Parse(format!("{e}: {}", preview(&text))))
    }
}

// --- Response shape ---

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

/// First text part of the first candidate, trimmed; empty text counts as
/// absent and yields the fallback prompt.
fn refined_or_fallback(response: &GenerateContentResponse, product_name: &str) -> String {
    let text = response.candidates.first().and_then(|candidate| {
        candidate.content.parts.iter().find_map(|part| match part {
            Part::Text { text } if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
    });
    text.unwrap_or_else(|| constants::fallback_prompt(product_name))
}

/// Scans the first candidate's parts in order and returns the first inlined
/// payload. Later images are ignored.
fn first_inline_image(response: &GenerateContentResponse) -> Option<String> {
    response.candidates.first().and_then(|candidate| {
        candidate.content.parts.iter().find_map(|part| match part {
            Part::Inline { inline_data } => Some(inline_data.data.clone()),
            _ => None,
        })
    })
}

/// Short prefix for logging. Keeps multi-megabyte base64 payloads out of
/// the logs.
fn preview(s: &str) -> String {
    const LIMIT: usize = 120;
    if s.len() <= LIMIT {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .take_while(|(i, _)| *i < LIMIT)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    format!("{}...[{} chars total]", &s[..cut], s.len())
}
