use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use shared::calculators::{CalculatorError, CalculatorKind, calculate_value};

use super::errors::bad_request_response;

/// `POST /api/calculators/{kind}`: runs a calculator over the JSON inputs.
pub(super) async fn calculate(Path(kind): Path<String>, body: Bytes) -> Response {
    let kind = match CalculatorKind::from_key(&kind) {
        Ok(kind) => kind,
        Err(err) => return calculator_error_response(&err),
    };

    let inputs: Value = match serde_json::from_slice(&body) {
        Ok(inputs) => inputs,
        Err(_) => return bad_request_response("invalid_json", "Request body must be JSON"),
    };

    match calculate_value(kind, &inputs) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(err) => calculator_error_response(&err),
    }
}

fn calculator_error_response(err: &CalculatorError) -> Response {
    let code = match err {
        CalculatorError::UnknownKind(_) => "unknown_calculator",
        CalculatorError::InvalidInput { .. } | CalculatorError::Payload(_) => "invalid_inputs",
    };
    bad_request_response(code, &err.to_string())
}
