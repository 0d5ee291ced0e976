pub mod assistant;
pub mod client;
pub mod fallback;
pub mod gateway;
pub mod operation;
pub mod prompts;
pub mod recommendations;
pub mod render;
pub mod safety;
pub mod upstream;

pub use assistant::{AiAssistant, AssistantReply, SalesChat};
pub use client::{CHAT_ENDPOINT_PATH, ChatEndpointClient};
pub use fallback::{fallback_calculator_explanation, fallback_recommendations, fallback_sales_reply};
pub use gateway::{
    CompletionError, CompletionFuture, CompletionGateway, CompletionRequest, CompletionResponse,
};
pub use operation::{MountScope, Operation, OperationError, OperationState, Ticket};
pub use prompts::{CalculatorTopic, MAX_PROMPT_CHARS, PromptContext, build_prompt};
pub use recommendations::{
    MAX_RECOMMENDATIONS, Recommendation, RecommendationKind, RecommendationParseError,
    RecommendationPriority, validate_recommendation_value,
};
pub use render::{
    RecommendationSet, ReplySource, extract_json_object, parse_recommendations, render_markup,
    resolve_recommendations,
};
pub use upstream::{UpstreamConfig, UpstreamGateway};
