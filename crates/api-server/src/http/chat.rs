use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::{CompletionGateway, CompletionRequest, MAX_PROMPT_CHARS};
use shared::models::{AiChatRequest, AiChatResponse};
use tracing::{info, warn};

use super::AppState;
use super::errors::{bad_gateway_response, bad_request_response};
use super::observability::RequestContext;

pub(super) const MAX_MESSAGES: usize = 20;

/// `POST /api/ai/chat`: forwards one prompt to the upstream provider.
pub(super) async fn chat_completion(
    State(state): State<AppState>,
    Extension(request_context): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let req: AiChatRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(err) => {
            return bad_request_response(
                "invalid_request",
                &format!("Request body is invalid: {err}"),
            );
        }
    };

    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return bad_request_response("invalid_prompt", "Prompt must not be empty");
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return bad_request_response(
            "prompt_too_long",
            &format!("Prompt must be at most {MAX_PROMPT_CHARS} characters"),
        );
    }

    let messages = req.messages.unwrap_or_default();
    if messages.len() > MAX_MESSAGES {
        return bad_request_response(
            "too_many_messages",
            &format!("At most {MAX_MESSAGES} messages are allowed"),
        );
    }

    let message_count = messages.len();
    let request = CompletionRequest::new(prompt)
        .with_model(&req.model)
        .with_messages(messages);

    match state.gateway.complete(request).await {
        Ok(response) => {
            info!(
                request_id = %request_context.request_id,
                model = response.model.as_deref().unwrap_or_default(),
                message_count,
                "chat completion served"
            );
            (
                StatusCode::OK,
                Json(AiChatResponse {
                    response: response.text,
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                request_id = %request_context.request_id,
                error_type = err.kind(),
                "chat completion failed: {err}"
            );
            bad_gateway_response("upstream_failed", "AI response failed")
        }
    }
}
