//! OpenAI-compatible chat-completions provider behind `/api/ai/chat`.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::gateway::{
    CompletionError, CompletionFuture, CompletionGateway, CompletionRequest, CompletionResponse,
};
use crate::chat::ChatTurn;
use crate::config::ConfigError;
use crate::config_env::{
    ensure_http_url, optional_trimmed_env, parse_list_env, parse_u32_env, parse_u64_env,
    require_non_empty_env,
};

pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_UPSTREAM_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;
const DEFAULT_MAX_TOKENS: u32 = 600;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
    pub max_tokens: u32,
    pub default_model: String,
    /// Models a caller may request. Empty means only `default_model`.
    pub allowed_models: Vec<String>,
}

impl UpstreamConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_non_empty_env("UPSTREAM_API_KEY")?;
        let chat_completions_url = optional_trimmed_env("UPSTREAM_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        ensure_http_url("UPSTREAM_CHAT_COMPLETIONS_URL", &chat_completions_url)?;

        Ok(Self {
            chat_completions_url,
            api_key,
            timeout_ms: parse_u64_env("UPSTREAM_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            max_retries: parse_u32_env("UPSTREAM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_backoff_ms: parse_u64_env(
                "UPSTREAM_RETRY_BASE_BACKOFF_MS",
                DEFAULT_RETRY_BASE_BACKOFF_MS,
            )?,
            max_tokens: parse_u32_env("UPSTREAM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            default_model: optional_trimmed_env("UPSTREAM_DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_MODEL.to_string()),
            allowed_models: parse_list_env("UPSTREAM_ALLOWED_MODELS"),
        })
    }

    /// The requested model when allowed, otherwise the default.
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(model)
                if !model.is_empty()
                    && (model == self.default_model
                        || self.allowed_models.iter().any(|allowed| allowed == model)) =>
            {
                model
            }
            _ => &self.default_model,
        }
    }
}

#[derive(Clone)]
pub struct UpstreamGateway {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamGateway {
    pub fn new(config: UpstreamConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let model = self.config.resolve_model(request.model.as_deref()).to_string();
        let mut attempt = 0_u32;

        loop {
            match self.send_once(&model, &request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if err.retryable && attempt < self.config.max_retries {
                        let backoff_ms = self
                            .config
                            .retry_base_backoff_ms
                            .saturating_mul(2_u64.saturating_pow(attempt));
                        debug!(
                            attempt,
                            backoff_ms,
                            error_type = err.error.kind(),
                            "retrying upstream completion"
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt = attempt.saturating_add(1);
                        continue;
                    }

                    warn!(
                        attempts = attempt + 1,
                        error_type = err.error.kind(),
                        model = %model,
                        "upstream completion failed"
                    );
                    return Err(err.error);
                }
            }
        }
    }

    async fn send_once(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AttemptError> {
        let body = UpstreamRequest {
            model,
            messages: upstream_messages(&request.messages, &request.prompt),
            max_tokens: self.config.max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AttemptError::retryable(CompletionError::Timeout)
                } else {
                    AttemptError::retryable(CompletionError::Transport(
                        "request_unavailable".to_string(),
                    ))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            AttemptError::final_error(CompletionError::InvalidPayload(
                "response_body_read_failed".to_string(),
            ))
        })?;

        if !status.is_success() {
            return Err(AttemptError {
                error: CompletionError::ResponseFailed {
                    status: status.as_u16(),
                },
                retryable: is_retryable_status(status),
            });
        }

        let parsed: UpstreamSuccessResponse = serde_json::from_str(&body).map_err(|_| {
            AttemptError::final_error(CompletionError::InvalidPayload(
                "response_json_parse_failed".to_string(),
            ))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| match choice.message.content {
                Value::String(text) => Some(text),
                _ => None,
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AttemptError::final_error(CompletionError::InvalidPayload(
                    "missing_content".to_string(),
                ))
            })?;

        Ok(CompletionResponse {
            text,
            model: Some(parsed.model.unwrap_or_else(|| model.to_string())),
        })
    }
}

impl CompletionGateway for UpstreamGateway {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.generate(request))
    }
}

#[derive(Debug)]
struct AttemptError {
    error: CompletionError,
    retryable: bool,
}

impl AttemptError {
    fn retryable(error: CompletionError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn final_error(error: CompletionError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: Vec<UpstreamMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct UpstreamMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpstreamSuccessResponse {
    model: Option<String>,
    choices: Vec<UpstreamChoice>,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoice {
    message: UpstreamChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoiceMessage {
    #[serde(default)]
    content: Value,
}

/// Conversation turns in order, then the prompt as the final user message.
fn upstream_messages<'a>(history: &'a [ChatTurn], prompt: &'a str) -> Vec<UpstreamMessage<'a>> {
    history
        .iter()
        .map(|turn| UpstreamMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        })
        .chain(std::iter::once(UpstreamMessage {
            role: "user",
            content: prompt,
        }))
        .collect()
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
