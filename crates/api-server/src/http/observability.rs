use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone, Debug)]
pub(super) struct RequestContext {
    pub(super) request_id: String,
}

/// Assigns a request id, echoes it in the response, and logs one line per request.
pub(super) async fn request_observability_middleware(mut req: Request, next: Next) -> Response {
    let request_id = resolve_request_id(&req);
    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let method = req.method().clone();
    let route = RouteKind::from_path(req.uri().path());
    let started_at = Instant::now();

    let mut response = next.run(req).await;
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    }

    let status = response.status().as_u16();
    let latency_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    if status >= 500 {
        warn!(
            request_id = %request_id,
            method = %method,
            route = route.as_str(),
            status,
            latency_ms,
            "request ended with server error"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            route = route.as_str(),
            status,
            latency_ms,
            "request served"
        );
    }

    response
}

/// Coarse label for the endpoint a request hit; keeps visitor-supplied
/// path segments out of the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Health,
    AiChat,
    Calculator,
    Unmatched,
}

impl RouteKind {
    fn from_path(path: &str) -> Self {
        match path {
            "/healthz" => Self::Health,
            "/api/ai/chat" => Self::AiChat,
            _ if path.starts_with("/api/calculators/") => Self::Calculator,
            _ => Self::Unmatched,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::AiChat => "ai_chat",
            Self::Calculator => "calculator",
            Self::Unmatched => "unmatched",
        }
    }
}

fn resolve_request_id(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(normalize_request_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn normalize_request_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_REQUEST_ID_LEN {
        return None;
    }

    let valid = trimmed
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'));
    valid.then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{RouteKind, normalize_request_id};

    #[test]
    fn classifies_assistant_routes() {
        assert_eq!(RouteKind::from_path("/api/ai/chat"), RouteKind::AiChat);
        assert_eq!(
            RouteKind::from_path("/api/calculators/prompt-roi"),
            RouteKind::Calculator
        );
        assert_eq!(RouteKind::from_path("/healthz"), RouteKind::Health);
        assert_eq!(RouteKind::from_path("/wp-admin").as_str(), "unmatched");
    }

    #[test]
    fn keeps_well_formed_request_ids() {
        assert_eq!(
            normalize_request_id(" widget-42.retry_1 "),
            Some("widget-42.retry_1".to_string())
        );
    }

    #[test]
    fn replaces_malformed_request_ids() {
        assert!(normalize_request_id("   ").is_none());
        assert!(normalize_request_id("id with spaces").is_none());
        assert!(normalize_request_id(&"a".repeat(129)).is_none());
    }
}
