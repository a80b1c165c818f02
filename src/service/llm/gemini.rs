use async_trait::async_trait;
use cyder_tools::log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmChat, LlmError, LlmResponse, build_llm_client};
use crate::config::CONFIG;

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiAdapter {
    pub fn from_config() -> Result<Self, LlmError> {
        Self::with_endpoint(CONFIG.llm.gemini_endpoint.clone())
    }

    /// Variant used for "Google Vertex" providers; same call convention,
    /// different endpoint.
    pub fn from_vertex_config() -> Result<Self, LlmError> {
        let endpoint = CONFIG
            .llm
            .vertex_endpoint
            .clone()
            .unwrap_or_else(|| CONFIG.llm.gemini_endpoint.clone());
        Self::with_endpoint(endpoint)
    }

    fn with_endpoint(endpoint: String) -> Result<Self, LlmError> {
        let api_key = CONFIG
            .llm
            .google_api_key
            .clone()
            .ok_or(LlmError::MissingCredential("GOOGLE_API_KEY"))?;
        Ok(Self {
            client: build_llm_client()?,
            api_key,
            endpoint,
        })
    }
}

#[async_trait]
impl LlmChat for GeminiAdapter {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        debug!("Gemini request: model={}, messages={}", model, messages.len());

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&build_request(messages))
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

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        normalize_response(payload, model)
    }
}

// ── Gemini wire types ──

#[derive(Serialize)]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: i64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: i64,
}

// System messages become the system_instruction; the rest map onto Gemini's
// user/model roles.
fn build_request(messages: &[ChatMessage]) -> GeminiRequest {
    let system_parts: Vec<GeminiPart> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| GeminiPart {
            text: m.content.clone(),
        })
        .collect();

    let contents = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| GeminiContent {
            role: if m.role == "assistant" {
                "model".to_string()
            } else {
                "user".to_string()
            },
            parts: vec![GeminiPart {
                text: m.content.clone(),
            }],
        })
        .collect();

    GeminiRequest {
        system_instruction: if system_parts.is_empty() {
            None
        } else {
            Some(GeminiSystemInstruction {
                parts: system_parts,
            })
        },
        contents,
    }
}

fn normalize_response(payload: GeminiResponse, requested_model: &str) -> Result<LlmResponse, LlmError> {
    let candidate = payload
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response contained no candidates".to_string()))?;
    let usage = payload.usage_metadata.unwrap_or_default();

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        input_tokens_consumed: usage.prompt_token_count,
        output_tokens_consumed: usage.candidates_token_count,
        model: payload
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        content,
        finish_reason: candidate.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request_maps_roles() {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "You are a helpful assistant.".to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: "What is the weather in Boston?".to_string(),
            },
            ChatMessage {
                role: "assistant".to_string(),
                content: "Let me check.".to_string(),
            },
        ];

        let body = serde_json::to_value(build_request(&messages)).unwrap();

        assert_eq!(
            body,
            json!({
                "system_instruction": {
                    "parts": [{"text": "You are a helpful assistant."}]
                },
                "contents": [
                    {"role": "user", "parts": [{"text": "What is the weather in Boston?"}]},
                    {"role": "model", "parts": [{"text": "Let me check."}]}
                ]
            })
        );
    }

    #[test]
    fn test_build_request_without_system_message() {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "hi".to_string(),
        }];

        let body = serde_json::to_value(build_request(&messages)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}]
            })
        );
    }

    #[test]
    fn test_normalize_response_basic() {
        let payload: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "It is "}, {"text": "sunny."}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 10,
                "candidatesTokenCount": 4,
                "totalTokenCount": 14
            },
            "modelVersion": "gemini-2.0-flash"
        }))
        .unwrap();

        let result = normalize_response(payload, "gemini-2.0-flash").unwrap();
        assert_eq!(result.input_tokens_consumed, 10);
        assert_eq!(result.output_tokens_consumed, 4);
        assert_eq!(result.content, "It is sunny.");
        assert_eq!(result.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_normalize_response_no_candidates_is_an_error() {
        let payload: GeminiResponse = serde_json::from_value(json!({
            "usageMetadata": {"promptTokenCount": 3}
        }))
        .unwrap();

        assert!(matches!(
            normalize_response(payload, "gemini-2.0-flash"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
