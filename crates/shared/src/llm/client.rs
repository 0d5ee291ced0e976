use std::time::Duration;

use super::gateway::{
    CompletionError, CompletionFuture, CompletionGateway, CompletionRequest, CompletionResponse,
};
use crate::config::{AssistantClientConfig, ConfigError};
use crate::models::{AiChatRequest, AiChatResponse};

pub const CHAT_ENDPOINT_PATH: &str = "/api/ai/chat";

/// Client for the site's completion endpoint. One POST per call, no retries.
#[derive(Clone)]
pub struct ChatEndpointClient {
    client: reqwest::Client,
    endpoint_url: String,
    default_model: String,
}

impl ChatEndpointClient {
    pub fn new(config: &AssistantClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            endpoint_url: format!(
                "{}{CHAT_ENDPOINT_PATH}",
                config.base_url.trim_end_matches('/')
            ),
            default_model: config.model.clone(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    async fn send(&self, request: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let model = request
            .model
            .unwrap_or_else(|| self.default_model.clone());
        let body = AiChatRequest {
            prompt: request.prompt,
            model: model.clone(),
            messages: (!request.messages.is_empty()).then_some(request.messages),
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::ResponseFailed {
                status: status.as_u16(),
            });
        }

        let payload = response
            .json::<AiChatResponse>()
            .await
            .map_err(|err| CompletionError::InvalidPayload(err.to_string()))?;

        Ok(CompletionResponse {
            text: payload.response,
            model: Some(model),
        })
    }
}

impl CompletionGateway for ChatEndpointClient {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.send(request))
    }
}
