use std::collections::VecDeque;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::chat::{ChatRole, ChatTurn};
use shared::llm::{
    CompletionError, CompletionGateway, CompletionRequest, UpstreamConfig, UpstreamGateway,
};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Clone)]
struct MockReply {
    status: StatusCode,
    body: Value,
}

#[derive(Debug, Clone)]
struct TestServerState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    seen_payloads: Arc<Mutex<Vec<Value>>>,
    seen_auth_headers: Arc<Mutex<Vec<String>>>,
}

impl TestServerState {
    fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            seen_payloads: Arc::new(Mutex::new(Vec::new())),
            seen_auth_headers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn seen_models(&self) -> Vec<String> {
        self.seen_payloads
            .lock()
            .await
            .iter()
            .filter_map(|payload| payload.get("model").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect()
    }
}

#[tokio::test]
async fn forwards_history_then_prompt_with_bearer_auth() {
    let state = TestServerState::with_replies(vec![success_reply("premium-model", "Hello!")]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 0)).expect("gateway should build");
    let request = CompletionRequest::new("What does the course cover?")
        .with_model("premium-model")
        .with_messages(vec![
            ChatTurn {
                role: ChatRole::User,
                content: "Hi".to_string(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                content: "Hello, how can I help?".to_string(),
            },
        ]);
    let response = gateway
        .complete(request)
        .await
        .expect("completion should succeed");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(response.text, "Hello!");
    assert_eq!(response.model.as_deref(), Some("premium-model"));

    let payloads = state.seen_payloads.lock().await.clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        payloads[0]["messages"],
        json!([
            { "role": "user", "content": "Hi" },
            { "role": "assistant", "content": "Hello, how can I help?" },
            { "role": "user", "content": "What does the course cover?" }
        ])
    );
    assert_eq!(payloads[0]["max_tokens"], 256);

    let seen_auth_headers = state.seen_auth_headers.lock().await.clone();
    assert_eq!(seen_auth_headers, vec!["Bearer test-upstream-key".to_string()]);
}

#[tokio::test]
async fn unlisted_model_is_replaced_by_default() {
    let state = TestServerState::with_replies(vec![success_reply("default-model", "ok")]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 0)).expect("gateway should build");
    gateway
        .complete(CompletionRequest::new("hi").with_model("very-expensive-model"))
        .await
        .expect("completion should succeed");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(state.seen_models().await, vec!["default-model".to_string()]);
}

#[tokio::test]
async fn retries_transient_failures_before_succeeding() {
    let state = TestServerState::with_replies(vec![
        error_reply(StatusCode::SERVICE_UNAVAILABLE, "overloaded"),
        error_reply(StatusCode::BAD_GATEWAY, "upstream_gateway"),
        success_reply("default-model", "third time lucky"),
    ]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 2)).expect("gateway should build");
    let response = gateway
        .complete(CompletionRequest::new("hi"))
        .await
        .expect("request should succeed after retries");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(response.text, "third time lucky");
    assert_eq!(state.seen_models().await.len(), 3);
}

#[tokio::test]
async fn gives_up_after_retry_budget() {
    let state = TestServerState::with_replies(vec![
        error_reply(StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        error_reply(StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        success_reply("default-model", "never reached"),
    ]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 1)).expect("gateway should build");
    let err = gateway
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("retry budget should be exhausted");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, CompletionError::ResponseFailed { status: 429 }));
    assert_eq!(state.seen_models().await.len(), 2);
}

#[tokio::test]
async fn does_not_retry_unauthorized() {
    let state = TestServerState::with_replies(vec![error_reply(
        StatusCode::UNAUTHORIZED,
        "invalid_api_key",
    )]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 3)).expect("gateway should build");
    let err = gateway
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("unauthorized should fail immediately");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(
        matches!(err, CompletionError::ResponseFailed { status: 401 }),
        "expected unauthorized failure, got {err:?}"
    );
    assert_eq!(err.to_string(), "AI response failed");
    assert_eq!(state.seen_models().await.len(), 1);
}

#[tokio::test]
async fn null_content_is_invalid_payload() {
    let state = TestServerState::with_replies(vec![MockReply {
        status: StatusCode::OK,
        body: json!({
            "model": "default-model",
            "choices": [{ "message": { "content": null } }]
        }),
    }]);
    let (url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let gateway = UpstreamGateway::new(config_for(url, 2)).expect("gateway should build");
    let err = gateway
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("null content should fail");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, CompletionError::InvalidPayload(_)));
    assert_eq!(state.seen_models().await.len(), 1);
}

fn config_for(chat_completions_url: String, max_retries: u32) -> UpstreamConfig {
    UpstreamConfig {
        chat_completions_url,
        api_key: "test-upstream-key".to_string(),
        timeout_ms: 5_000,
        max_retries,
        retry_base_backoff_ms: 0,
        max_tokens: 256,
        default_model: "default-model".to_string(),
        allowed_models: vec!["premium-model".to_string()],
    }
}

fn success_reply(model: &str, content: &str) -> MockReply {
    MockReply {
        status: StatusCode::OK,
        body: json!({
            "id": "req-success",
            "model": model,
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": content
                    }
                }
            ]
        }),
    }
}

fn error_reply(status: StatusCode, code: &str) -> MockReply {
    MockReply {
        status,
        body: json!({
            "error": {
                "code": code
            }
        }),
    }
}

async fn spawn_test_server(
    state: TestServerState,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/chat/completions", post(test_chat_completions_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        server.await.expect("test server should run");
    });

    (
        format!("http://{local_addr}/chat/completions"),
        shutdown_tx,
        server_task,
    )
}

async fn test_chat_completions_handler(
    State(state): State<TestServerState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen_payloads.lock().await.push(payload);

    if let Some(value) = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        state.seen_auth_headers.lock().await.push(value.to_string());
    }

    let reply = state.replies.lock().await.pop_front().unwrap_or(MockReply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: json!({
            "error": {
                "code": "exhausted_test_replies"
            }
        }),
    });

    (reply.status, Json(reply.body))
}
