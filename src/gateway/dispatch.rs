use rand::seq::IndexedRandom;

use crate::database::model::MappingDetail;
use crate::service::llm::{
    ChatMessage, ClaudeAdapter, GeminiAdapter, LlmChat, LlmError, LlmResponse, OpenAiAdapter,
};

pub const PROVIDER_GOOGLE_API: &str = "Google API";
pub const PROVIDER_GOOGLE_VERTEX: &str = "Google Vertex";
pub const PROVIDER_OPENAI: &str = "OpenAI";
pub const PROVIDER_CLAUDE_API: &str = "Claude API";

/// The closed set of vendors this gateway can dispatch to. A provider row
/// whose name is outside this set fails dispatch with a named error, never
/// a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GoogleApi,
    GoogleVertex,
    OpenAi,
    ClaudeApi,
}

impl ProviderKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            PROVIDER_GOOGLE_API => Some(ProviderKind::GoogleApi),
            PROVIDER_GOOGLE_VERTEX => Some(ProviderKind::GoogleVertex),
            PROVIDER_OPENAI => Some(ProviderKind::OpenAi),
            PROVIDER_CLAUDE_API => Some(ProviderKind::ClaudeApi),
            _ => None,
        }
    }

    pub async fn chat(
        self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<LlmResponse, LlmError> {
        match self {
            ProviderKind::GoogleApi => {
                GeminiAdapter::from_config()?.chat(model, messages).await
            }
            ProviderKind::GoogleVertex => {
                GeminiAdapter::from_vertex_config()?
                    .chat(model, messages)
                    .await
            }
            ProviderKind::OpenAi => OpenAiAdapter::from_config()?.chat(model, messages).await,
            ProviderKind::ClaudeApi => ClaudeAdapter::from_config()?.chat(model, messages).await,
        }
    }
}

/// Uniformly random choice over the eligible pool; plain load spreading,
/// no weighting or stickiness.
pub fn pick_mapping(mappings: &[MappingDetail]) -> Option<&MappingDetail> {
    mappings.choose(&mut rand::rng())
}

/// The provider-native model name is everything after the first `/` of the
/// public slug; a slug with no separator is passed through verbatim.
pub fn provider_model_name(slug: &str) -> &str {
    slug.splitn(2, '/').nth(1).unwrap_or(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::model::ModelProviderMapping;

    #[test]
    fn test_from_name_matches_known_vendor_set() {
        assert_eq!(
            ProviderKind::from_name("Google API"),
            Some(ProviderKind::GoogleApi)
        );
        assert_eq!(
            ProviderKind::from_name("Google Vertex"),
            Some(ProviderKind::GoogleVertex)
        );
        assert_eq!(ProviderKind::from_name("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(
            ProviderKind::from_name("Claude API"),
            Some(ProviderKind::ClaudeApi)
        );
    }

    #[test]
    fn test_from_name_rejects_unknown_names() {
        assert_eq!(ProviderKind::from_name("Azure"), None);
        assert_eq!(ProviderKind::from_name("openai"), None);
        assert_eq!(ProviderKind::from_name(""), None);
    }

    #[test]
    fn test_provider_model_name_strips_first_segment() {
        assert_eq!(provider_model_name("openai/gpt-4"), "gpt-4");
        assert_eq!(provider_model_name("google/gemini-2.0-flash"), "gemini-2.0-flash");
        // only the first separator splits; the rest belongs to the model name
        assert_eq!(
            provider_model_name("ns/anthropic/claude-sonnet-4-5"),
            "anthropic/claude-sonnet-4-5"
        );
        assert_eq!(provider_model_name("gpt-4"), "gpt-4");
    }

    fn mapping_detail(id: i64) -> MappingDetail {
        MappingDetail {
            mapping: ModelProviderMapping {
                id,
                ..Default::default()
            },
            provider_name: "OpenAI".to_string(),
        }
    }

    #[test]
    fn test_pick_mapping_empty_pool() {
        assert!(pick_mapping(&[]).is_none());
    }

    #[test]
    fn test_pick_mapping_is_roughly_uniform() {
        let pool: Vec<MappingDetail> = (0..3).map(mapping_detail).collect();
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let picked = pick_mapping(&pool).unwrap();
            counts[picked.mapping.id as usize] += 1;
        }
        // each of k=3 candidates should land near 1/k of 3000 draws
        for count in counts {
            assert!(count > 700, "selection is skewed: {:?}", counts);
            assert!(count < 1300, "selection is skewed: {:?}", counts);
        }
    }
}
