use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::fallback::{fallback_calculator_explanation, fallback_recommendations, fallback_sales_reply};
use super::gateway::{CompletionError, CompletionGateway, CompletionRequest};
use super::prompts::{CalculatorTopic, PromptContext, SALES_HISTORY_TURNS, build_prompt};
use super::render::{RecommendationSet, ReplySource, render_markup, resolve_recommendations};
use crate::chat::{ChatMessage, ChatTranscript, ChatTurn};
use crate::pages::PageKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantReply {
    pub text: String,
    pub html: String,
    pub source: ReplySource,
}

impl AssistantReply {
    fn new(text: String, source: ReplySource) -> Self {
        Self {
            html: render_markup(&text),
            text,
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ReplySource::Fallback
    }
}

/// Prompt, one completion call, and fallback. Never surfaces an error.
pub struct AiAssistant<G> {
    gateway: G,
    model: Option<String>,
    history_turns: usize,
}

impl<G> AiAssistant<G>
where
    G: CompletionGateway,
{
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            model: None,
            history_turns: SALES_HISTORY_TURNS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = (!model.trim().is_empty()).then_some(model);
        self
    }

    pub fn with_history_turns(mut self, history_turns: usize) -> Self {
        self.history_turns = history_turns;
        self
    }

    pub async fn explain_calculation(
        &self,
        topic: CalculatorTopic,
        inputs: Value,
        results: Value,
    ) -> AssistantReply {
        let fallback = fallback_calculator_explanation(&topic);
        let label = topic.label().to_string();
        let prompt = build_prompt(&PromptContext::CalculatorInsight {
            topic,
            inputs,
            results,
        });

        match self.complete(prompt, Vec::new()).await {
            Ok(text) => AssistantReply::new(text, ReplySource::Model),
            Err(err) => {
                warn!(
                    calculator = %label,
                    error_type = err.kind(),
                    "calculator explanation failed, using fallback"
                );
                AssistantReply::new(fallback.to_string(), ReplySource::Fallback)
            }
        }
    }

    /// `history` is the conversation before `visitor_message`.
    pub async fn sales_reply(
        &self,
        page: &str,
        history: &[ChatTurn],
        visitor_message: &str,
    ) -> AssistantReply {
        let start = history.len().saturating_sub(self.history_turns);
        let recent = history[start..].to_vec();
        let prompt = build_prompt(&PromptContext::SalesChat {
            page: page.to_string(),
            visitor_message: visitor_message.to_string(),
            history: recent.clone(),
        });

        match self.complete(prompt, recent).await {
            Ok(text) => AssistantReply::new(text, ReplySource::Model),
            Err(err) => {
                warn!(
                    page_kind = PageKind::classify(page).as_str(),
                    error_type = err.kind(),
                    "sales reply failed, using fallback"
                );
                AssistantReply::new(fallback_sales_reply(page).to_string(), ReplySource::Fallback)
            }
        }
    }

    pub async fn recommend(
        &self,
        page: &str,
        results: Option<Value>,
        interests: Vec<String>,
    ) -> RecommendationSet {
        let has_results = results.as_ref().is_some_and(has_content);
        let prompt = build_prompt(&PromptContext::Recommendations {
            page: page.to_string(),
            results,
            interests,
        });

        match self.complete(prompt, Vec::new()).await {
            Ok(text) => resolve_recommendations(&text, fallback_recommendations(page, has_results)),
            Err(err) => {
                warn!(
                    page_kind = PageKind::classify(page).as_str(),
                    error_type = err.kind(),
                    "recommendations failed, using fallback"
                );
                RecommendationSet {
                    items: fallback_recommendations(page, has_results),
                    source: ReplySource::Fallback,
                }
            }
        }
    }

    async fn complete(
        &self,
        prompt: String,
        messages: Vec<ChatTurn>,
    ) -> Result<String, CompletionError> {
        let mut request = CompletionRequest::new(prompt).with_messages(messages);
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }

        let response = self.gateway.complete(request).await?;
        if response.text.trim().is_empty() {
            return Err(CompletionError::InvalidPayload("empty_response".to_string()));
        }

        debug!(model = ?response.model, "completion received");
        Ok(response.text)
    }
}

/// Chat widget state: the transcript plus the assistant that answers it.
pub struct SalesChat<G> {
    assistant: AiAssistant<G>,
    page: String,
    transcript: ChatTranscript,
}

impl<G> SalesChat<G>
where
    G: CompletionGateway,
{
    pub fn new(assistant: AiAssistant<G>, page: impl Into<String>) -> Self {
        Self {
            assistant,
            page: page.into(),
            transcript: ChatTranscript::new(),
        }
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// Records the visitor message and the reply. Blank input is ignored.
    pub async fn send(&mut self, visitor_message: &str) -> Option<AssistantReply> {
        let message = visitor_message.trim();
        if message.is_empty() {
            return None;
        }

        let history = self.transcript.recent_turns(self.assistant.history_turns);
        self.transcript.push(ChatMessage::user(message));

        let reply = self
            .assistant
            .sales_reply(&self.page, &history, message)
            .await;
        self.transcript.push(ChatMessage::assistant(reply.text.clone()));

        Some(reply)
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(entries) => !entries.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
