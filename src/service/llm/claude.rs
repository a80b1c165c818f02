use async_trait::async_trait;
use cyder_tools::log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmChat, LlmError, LlmResponse, build_llm_client};
use crate::config::CONFIG;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
}

impl ClaudeAdapter {
    pub fn from_config() -> Result<Self, LlmError> {
        let api_key = CONFIG
            .llm
            .anthropic_api_key
            .clone()
            .ok_or(LlmError::MissingCredential("ANTHROPIC_API_KEY"))?;
        Ok(Self {
            client: build_llm_client()?,
            api_key,
            endpoint: CONFIG.llm.anthropic_endpoint.clone(),
            max_tokens: CONFIG.llm.max_output_tokens,
        })
    }
}

#[async_trait]
impl LlmChat for ClaudeAdapter {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/messages", self.endpoint);
        debug!("Claude request: model={}, messages={}", model, messages.len());

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&build_request(model, self.max_tokens, messages))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(normalize_response(payload, model))
    }
}

// ── Anthropic wire types ──

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    model: Option<String>,
    content: Vec<ClaudeBlock>,
    stop_reason: Option<String>,
    usage: ClaudeUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Default)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: i64,
    #[serde(default)]
    output_tokens: i64,
}

// System messages are lifted into the top-level system field; Anthropic's
// messages array only accepts user/assistant turns.
fn build_request<'a>(model: &'a str, max_tokens: u32, messages: &[ChatMessage]) -> ClaudeRequest<'a> {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();

    let claude_messages = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| ClaudeMessage {
            role: if m.role == "assistant" {
                "assistant".to_string()
            } else {
                "user".to_string()
            },
            content: m.content.clone(),
        })
        .collect();

    ClaudeRequest {
        model,
        max_tokens,
        system: if system_text.is_empty() {
            None
        } else {
            Some(system_text.join("\n\n"))
        },
        messages: claude_messages,
    }
}

fn normalize_response(payload: ClaudeResponse, requested_model: &str) -> LlmResponse {
    let content = payload
        .content
        .into_iter()
        .filter_map(|block| match block {
            ClaudeBlock::Text { text } => Some(text),
            ClaudeBlock::Unknown => None,
        })
        .collect::<Vec<_>>()
        .concat();

    LlmResponse {
        input_tokens_consumed: payload.usage.input_tokens,
        output_tokens_consumed: payload.usage.output_tokens,
        model: payload.model.unwrap_or_else(|| requested_model.to_string()),
        content,
        finish_reason: payload.stop_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request_lifts_system_messages() {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "Be brief.".to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            },
        ];

        let body = serde_json::to_value(build_request("claude-sonnet-4-5", 1024, &messages)).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "claude-sonnet-4-5",
                "max_tokens": 1024,
                "system": "Be brief.",
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[test]
    fn test_build_request_without_system_omits_field() {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "hello".to_string(),
        }];

        let body = serde_json::to_value(build_request("claude-sonnet-4-5", 1024, &messages)).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_normalize_response_concatenates_text_blocks() {
        let payload: ClaudeResponse = serde_json::from_value(json!({
            "id": "msg_123",
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": " world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 20, "output_tokens": 7}
        }))
        .unwrap();

        let result = normalize_response(payload, "claude-sonnet-4-5");
        assert_eq!(result.content, "Hello world");
        assert_eq!(result.input_tokens_consumed, 20);
        assert_eq!(result.output_tokens_consumed, 7);
        assert_eq!(result.finish_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_normalize_response_skips_unknown_blocks() {
        let payload: ClaudeResponse = serde_json::from_value(json!({
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "answer"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 2}
        }))
        .unwrap();

        let result = normalize_response(payload, "claude-sonnet-4-5");
        assert_eq!(result.content, "answer");
    }
}
