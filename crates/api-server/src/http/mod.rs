use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::llm::CompletionGateway;

mod calculators;
mod chat;
mod errors;
mod health;
mod observability;


#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn CompletionGateway>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/ai/chat", post(chat::chat_completion))
        .route("/api/calculators/{kind}", post(calculators::calculate))
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
        .with_state(app_state)
}
