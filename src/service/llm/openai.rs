use async_trait::async_trait;
use cyder_tools::log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmChat, LlmError, LlmResponse, build_llm_client};
use crate::config::CONFIG;

pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiAdapter {
    pub fn from_config() -> Result<Self, LlmError> {
        let api_key = CONFIG
            .llm
            .openai_api_key
            .clone()
            .ok_or(LlmError::MissingCredential("OPENAI_API_KEY"))?;
        Ok(Self {
            client: build_llm_client()?,
            api_key,
            endpoint: CONFIG.llm.openai_endpoint.clone(),
        })
    }
}

#[async_trait]
impl LlmChat for OpenAiAdapter {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("OpenAI request: model={}, messages={}", model, messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&OpenAiRequest { model, messages })
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

        let payload: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        normalize_response(payload, model)
    }
}

// ── OpenAI wire types ──

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
}

fn normalize_response(payload: OpenAiResponse, requested_model: &str) -> Result<LlmResponse, LlmError> {
    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;
    let usage = payload.usage.unwrap_or_default();

    Ok(LlmResponse {
        input_tokens_consumed: usage.prompt_tokens,
        output_tokens_consumed: usage.completion_tokens,
        model: payload.model.unwrap_or_else(|| requested_model.to_string()),
        content: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_response_basic() {
        let payload: OpenAiResponse = serde_json::from_value(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "gpt-4-0613",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
        }))
        .unwrap();

        let result = normalize_response(payload, "gpt-4").unwrap();
        assert_eq!(result.input_tokens_consumed, 9);
        assert_eq!(result.output_tokens_consumed, 12);
        assert_eq!(result.model, "gpt-4-0613");
        assert_eq!(result.content, "Hello there!");
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_normalize_response_missing_usage_counts_zero() {
        let payload: OpenAiResponse = serde_json::from_value(json!({
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "ok"}
            }]
        }))
        .unwrap();

        let result = normalize_response(payload, "gpt-4").unwrap();
        assert_eq!(result.input_tokens_consumed, 0);
        assert_eq!(result.output_tokens_consumed, 0);
        assert!(result.finish_reason.is_none());
    }

    #[test]
    fn test_normalize_response_no_choices_is_an_error() {
        let payload: OpenAiResponse = serde_json::from_value(json!({
            "model": "gpt-4",
            "choices": []
        }))
        .unwrap();

        assert!(matches!(
            normalize_response(payload, "gpt-4"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "hi".to_string(),
        }];
        let body = serde_json::to_value(OpenAiRequest {
            model: "gpt-4",
            messages: &messages,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "gpt-4",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }
}
