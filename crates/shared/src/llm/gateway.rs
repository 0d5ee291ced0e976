use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::chat::ChatTurn;

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, CompletionError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub messages: Vec<ChatTurn>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            messages: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl AsRef<str>) -> Self {
        let trimmed = model.as_ref().trim();
        if !trimmed.is_empty() {
            self.model = Some(trimmed.to_string());
        }
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatTurn>) -> Self {
        self.messages = messages;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
    pub model: Option<String>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("AI response failed")]
    ResponseFailed { status: u16 },
    #[error("AI request timed out")]
    Timeout,
    #[error("AI request could not be sent: {0}")]
    Transport(String),
    #[error("AI response payload is invalid: {0}")]
    InvalidPayload(String),
}

impl CompletionError {
    /// Stable label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ResponseFailed { .. } => "response_failed",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

pub trait CompletionGateway: Send + Sync {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a>;
}

impl<G> CompletionGateway for Arc<G>
where
    G: CompletionGateway + ?Sized,
{
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a> {
        (**self).complete(request)
    }
}
