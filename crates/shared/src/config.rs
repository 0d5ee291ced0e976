use thiserror::Error;

use crate::config_env::{
    optional_trimmed_env, parse_http_url_env, parse_u64_env, parse_usize_env,
};
use crate::llm::upstream::UpstreamConfig;

pub const DEFAULT_API_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ASSISTANT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_ASSISTANT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_ASSISTANT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_ASSISTANT_HISTORY_TURNS: usize = 6;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub upstream: UpstreamConfig,
}

/// Settings for widgets that talk to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub history_turns: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// Loads `.env` from the working directory when present. A missing file is not an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: optional_trimmed_env("API_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_API_BIND_ADDR.to_string()),
            upstream: UpstreamConfig::from_env()?,
        })
    }
}

impl Default for AssistantClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ASSISTANT_BASE_URL.to_string(),
            model: DEFAULT_ASSISTANT_MODEL.to_string(),
            timeout_ms: DEFAULT_ASSISTANT_TIMEOUT_MS,
            history_turns: DEFAULT_ASSISTANT_HISTORY_TURNS,
        }
    }
}

impl AssistantClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms = parse_u64_env("ASSISTANT_TIMEOUT_MS", DEFAULT_ASSISTANT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "ASSISTANT_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url: parse_http_url_env("ASSISTANT_BASE_URL", DEFAULT_ASSISTANT_BASE_URL)?,
            model: optional_trimmed_env("ASSISTANT_MODEL")
                .unwrap_or_else(|| DEFAULT_ASSISTANT_MODEL.to_string()),
            timeout_ms,
            history_turns: parse_usize_env(
                "ASSISTANT_HISTORY_TURNS",
                DEFAULT_ASSISTANT_HISTORY_TURNS,
            )?,
        })
    }
}
