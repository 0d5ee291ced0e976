use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::chat::{ChatRole, ChatTurn};
use shared::config::AssistantClientConfig;
use shared::calculators::CalculatorKind;
use shared::llm::{
    AiAssistant, CalculatorTopic, ChatEndpointClient, CompletionError, CompletionGateway,
    CompletionRequest, ReplySource, fallback_calculator_explanation,
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
}

impl TestServerState {
    fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            seen_payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[tokio::test]
async fn posts_prompt_model_and_messages() {
    let state = TestServerState::with_replies(vec![MockReply {
        status: StatusCode::OK,
        body: json!({ "response": "The course takes about two weeks." }),
    }]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let client = ChatEndpointClient::new(&config_for(base_url.clone())).expect("client builds");
    assert_eq!(client.endpoint_url(), format!("{base_url}/api/ai/chat"));

    let response = client
        .complete(
            CompletionRequest::new("How long is the course?").with_messages(vec![ChatTurn {
                role: ChatRole::User,
                content: "Hi".to_string(),
            }]),
        )
        .await
        .expect("completion should succeed");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(response.text, "The course takes about two weeks.");
    assert_eq!(response.model.as_deref(), Some("site-model"));

    let payloads = state.seen_payloads.lock().await.clone();
    assert_eq!(
        payloads,
        vec![json!({
            "prompt": "How long is the course?",
            "model": "site-model",
            "messages": [{ "role": "user", "content": "Hi" }]
        })]
    );
}

#[tokio::test]
async fn omits_messages_when_empty_and_honors_model_override() {
    let state = TestServerState::with_replies(vec![MockReply {
        status: StatusCode::OK,
        body: json!({ "response": "ok" }),
    }]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let client = ChatEndpointClient::new(&config_for(base_url)).expect("client builds");
    client
        .complete(CompletionRequest::new("hi").with_model("other-model"))
        .await
        .expect("completion should succeed");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    let payloads = state.seen_payloads.lock().await.clone();
    assert_eq!(payloads, vec![json!({ "prompt": "hi", "model": "other-model" })]);
}

#[tokio::test]
async fn non_success_status_is_generic_failure_without_retry() {
    let state = TestServerState::with_replies(vec![
        MockReply {
            status: StatusCode::BAD_GATEWAY,
            body: json!({ "error": { "code": "upstream_failed", "message": "boom" } }),
        },
        MockReply {
            status: StatusCode::OK,
            body: json!({ "response": "never reached" }),
        },
    ]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let client = ChatEndpointClient::new(&config_for(base_url)).expect("client builds");
    let err = client
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("502 should fail");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, CompletionError::ResponseFailed { status: 502 }));
    assert_eq!(err.to_string(), "AI response failed");
    assert_eq!(state.seen_payloads.lock().await.len(), 1);
}

#[tokio::test]
async fn malformed_body_is_invalid_payload() {
    let state = TestServerState::with_replies(vec![MockReply {
        status: StatusCode::OK,
        body: json!({ "text": "wrong field" }),
    }]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let client = ChatEndpointClient::new(&config_for(base_url)).expect("client builds");
    let err = client
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("missing response field should fail");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, CompletionError::InvalidPayload(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener.local_addr().expect("address should resolve");
    drop(listener);

    let client =
        ChatEndpointClient::new(&config_for(format!("http://{local_addr}"))).expect("client builds");
    let err = client
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("closed port should fail");

    assert!(matches!(err, CompletionError::Transport(_)));
}

#[tokio::test]
async fn slow_endpoint_times_out_and_assistant_falls_back_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base_url, shutdown_tx, server_task) = spawn_slow_server(Arc::clone(&hits)).await;
    let config = AssistantClientConfig {
        timeout_ms: 50,
        ..config_for(base_url)
    };
    let client = ChatEndpointClient::new(&config).expect("client builds");

    let err = client
        .complete(CompletionRequest::new("hi"))
        .await
        .expect_err("slow endpoint should time out");
    assert!(matches!(err, CompletionError::Timeout));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let assistant = AiAssistant::new(client);
    let topic = CalculatorTopic::Known(CalculatorKind::ContentSpeed);
    let reply = assistant
        .explain_calculation(topic.clone(), json!({ "weeklyPieces": 5 }), json!({}))
        .await;

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.text, fallback_calculator_explanation(&topic));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

async fn spawn_slow_server(
    hits: Arc<AtomicUsize>,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/ai/chat", post(slow_chat_handler))
        .with_state(hits);

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

    (format!("http://{local_addr}"), shutdown_tx, server_task)
}

async fn slow_chat_handler(State(hits): State<Arc<AtomicUsize>>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "response": "too late" }))
}

fn config_for(base_url: String) -> AssistantClientConfig {
    AssistantClientConfig {
        base_url,
        model: "site-model".to_string(),
        timeout_ms: 5_000,
        history_turns: 6,
    }
}

async fn spawn_test_server(
    state: TestServerState,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/ai/chat", post(test_chat_handler))
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

    (format!("http://{local_addr}"), shutdown_tx, server_task)
}

async fn test_chat_handler(
    State(state): State<TestServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen_payloads.lock().await.push(payload);

    let reply = state.replies.lock().await.pop_front().unwrap_or(MockReply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: json!({ "error": { "code": "exhausted_test_replies", "message": "none" } }),
    });

    (reply.status, Json(reply.body))
}
