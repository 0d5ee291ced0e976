use shared::llm::{CompletionError, CompletionFuture, CompletionGateway, CompletionRequest};

/// Gateway that never reaches the network, so every call takes the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

impl CompletionGateway for OfflineGateway {
    fn complete<'a>(&'a self, _request: CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(async {
            Err(CompletionError::Transport(
                "offline mode: completion endpoint disabled".to_string(),
            ))
        })
    }
}
