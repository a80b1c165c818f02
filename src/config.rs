use std::{fs, path::Path};

use once_cell::sync::Lazy;
use rand::{Rng, distr::Alphanumeric, rng};
use serde::{Deserialize, Serialize};

// --- LLM VENDOR CONFIG ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub google_api_key: Option<String>,
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
    /// Endpoint used by "Google Vertex" providers; falls back to `gemini_endpoint`.
    pub vertex_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_anthropic_endpoint")]
    pub anthropic_endpoint: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            gemini_endpoint: default_gemini_endpoint(),
            vertex_endpoint: None,
            openai_api_key: None,
            openai_endpoint: default_openai_endpoint(),
            anthropic_api_key: None,
            anthropic_endpoint: default_anthropic_endpoint(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialLlmConfig {
    pub google_api_key: Option<String>,
    pub gemini_endpoint: Option<String>,
    pub vertex_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_endpoint: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_endpoint: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl PartialLlmConfig {
    fn merge_into(self, final_config: &mut LlmConfig) {
        if let Some(google_api_key) = self.google_api_key {
            final_config.google_api_key = Some(google_api_key);
        }
        if let Some(gemini_endpoint) = self.gemini_endpoint {
            final_config.gemini_endpoint = gemini_endpoint;
        }
        if let Some(vertex_endpoint) = self.vertex_endpoint {
            final_config.vertex_endpoint = Some(vertex_endpoint);
        }
        if let Some(openai_api_key) = self.openai_api_key {
            final_config.openai_api_key = Some(openai_api_key);
        }
        if let Some(openai_endpoint) = self.openai_endpoint {
            final_config.openai_endpoint = openai_endpoint;
        }
        if let Some(anthropic_api_key) = self.anthropic_api_key {
            final_config.anthropic_api_key = Some(anthropic_api_key);
        }
        if let Some(anthropic_endpoint) = self.anthropic_endpoint {
            final_config.anthropic_endpoint = anthropic_endpoint;
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            final_config.max_output_tokens = max_output_tokens;
        }
        if let Some(request_timeout_secs) = self.request_timeout_secs {
            final_config.request_timeout_secs = request_timeout_secs;
        }
    }
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    120
}

// Used for deserializing user-provided config files where all fields are optional.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_path: Option<String>,
    pub secret_key: Option<String>,
    pub db_url: Option<String>,
    pub log_level: Option<String>,
    pub llm: Option<PartialLlmConfig>,
}

impl PartialConfig {
    /// Merges the fields of this partial config into a final config, overwriting existing values.
    fn merge_into(self, final_config: &mut FinalConfig) {
        if let Some(host) = self.host {
            final_config.host = host;
        }
        if let Some(port) = self.port {
            final_config.port = port;
        }
        if let Some(base_path) = self.base_path {
            final_config.base_path = base_path;
        }
        if let Some(secret_key) = self.secret_key {
            final_config.secret_key = secret_key;
        }
        if let Some(db_url) = self.db_url {
            final_config.db_url = db_url;
        }
        if let Some(log_level) = self.log_level {
            final_config.log_level = log_level;
        }
        if let Some(llm) = self.llm {
            llm.merge_into(&mut final_config.llm);
        }
    }
}

// The fully resolved configuration used by the application.
#[derive(Debug, Deserialize, Serialize)]
pub struct FinalConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub secret_key: String,
    pub db_url: String,
    pub log_level: String,
    pub llm: LlmConfig,
}

fn generate_random_string(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn get_env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn get_config_from_env() -> PartialConfig {
    PartialConfig {
        host: get_env_var("HOST"),
        port: get_env_var("PORT"),
        base_path: get_env_var("BASE_PATH"),
        secret_key: get_env_var("SECRET_KEY"),
        db_url: get_env_var("DB_URL"),
        log_level: get_env_var("LOG_LEVEL"),
        llm: Some(PartialLlmConfig {
            google_api_key: get_env_var("GOOGLE_API_KEY"),
            openai_api_key: get_env_var("OPENAI_API_KEY"),
            anthropic_api_key: get_env_var("ANTHROPIC_API_KEY"),
            ..Default::default()
        }),
    }
}

pub static CONFIG: Lazy<FinalConfig> = Lazy::new(|| {
    // Programmatic defaults; a missing config file is not an error.
    let mut final_config = FinalConfig {
        host: "0.0.0.0".to_string(),
        port: 4000,
        base_path: "/api/v1".to_string(),
        secret_key: generate_random_string(48),
        db_url: "./storage/sqlite.db".to_string(),
        log_level: "info".to_string(),
        llm: LlmConfig::default(),
    };

    let user_config_path = if Path::new("config.local.yaml").exists() {
        Path::new("config.local.yaml")
    } else {
        Path::new("config.yaml")
    };

    if user_config_path.exists() {
        if let Ok(config_str) = fs::read_to_string(user_config_path) {
            let user_config: PartialConfig = serde_yaml::from_str(&config_str)
                .unwrap_or_else(|e| {
                    panic!(
                        "Failed to parse configuration file at {:?}: {}",
                        user_config_path, e
                    )
                });
            user_config.merge_into(&mut final_config);
        }
    }

    // Environment variables have the highest priority.
    get_config_from_env().merge_into(&mut final_config);

    final_config
});

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> FinalConfig {
        FinalConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
            base_path: "/api/v1".to_string(),
            secret_key: "secret".to_string(),
            db_url: "./storage/sqlite.db".to_string(),
            log_level: "info".to_string(),
            llm: LlmConfig::default(),
        }
    }

    #[test]
    fn test_merge_overrides_only_present_fields() {
        let mut config = base_config();
        let partial: PartialConfig = serde_yaml::from_str(
            r#"
port: 9100
llm:
  openai_api_key: sk-test
  request_timeout_secs: 30
"#,
        )
        .unwrap();

        partial.merge_into(&mut config);

        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.request_timeout_secs, 30);
        assert_eq!(config.llm.openai_endpoint, "https://api.openai.com/v1");
        assert!(config.llm.anthropic_api_key.is_none());
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        let parsed = serde_yaml::from_str::<PartialConfig>("listen_port: 1234\n");
        assert!(parsed.is_err());
    }
}
