//! Vendor adapters. Each one translates a vendor-agnostic conversation into
//! one provider's call convention and normalizes the reply into [`LlmResponse`],
//! carrying the token counts the provider reported.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CONFIG;

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Normalized reply of one completed vendor call. Never persisted; consumed
/// immediately for billing and then returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    pub input_tokens_consumed: i64,
    pub output_tokens_consumed: i64,
    pub model: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),
    #[error("provider request timed out")]
    Timeout,
    #[error("provider request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}

/// The one operation every vendor adapter exposes.
#[async_trait]
pub trait LlmChat {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError>;
}

// All adapters share the configured upstream timeout; expiry surfaces as
// `LlmError::Timeout` rather than hanging the request.
pub(crate) fn build_llm_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(CONFIG.llm.request_timeout_secs))
        .build()
        .map_err(LlmError::Transport)
}
