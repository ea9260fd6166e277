//! Host-provided API-key selection capability.
//!
//! The key itself is never handed over; the bridge only answers whether one
//! has been selected and can kick off the host's selection flow. Kept behind
//! a trait so the pipeline can be tested with deterministic fakes.

use async_trait::async_trait;
use tracing::warn;

#[async_trait]
pub trait KeyBridge: Send + Sync {
    async fn has_selected_api_key(&self) -> bool;
    async fn open_select_key(&self);
}

/// Production bridge: a key is "selected" when `GEMINI_API_KEY` is set.
/// Selection itself happens outside this process (host UI, `.env` edit), so
/// `open_select_key` can only point the operator there.
pub struct EnvKeyBridge;

#[async_trait]
impl KeyBridge for EnvKeyBridge {
    async fn has_selected_api_key(&self) -> bool {
        std::env::var("GEMINI_API_KEY")
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    async fn open_select_key(&self) {
        warn!("key selection requested; set GEMINI_API_KEY and retry");
    }
}
