//! JSON response dispatch.
//!
//! [`with_json`] is the only place a response body is serialized.  When
//! serialization fails the caller gets a fixed fallback body and a `500`;
//! there is no further fallback after that.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tablegate_kernel::ValidationFailures;
use tracing::error;

const ENCODE_FAILURE_BODY: &str = r#"{"error":"failed to encode json","status":500}"#;

/// `{"error": ..., "status": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub status: u16,
}

/// `{"error": ..., "invalidFields": {...}, "status": 400}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadRequestBody<'a> {
    pub error: &'a str,
    pub invalid_fields: &'a ValidationFailures,
    pub status: u16,
}

/// Serialize `value` and answer with `status`.
pub fn with_json<T: Serialize + ?Sized>(value: &T, status: StatusCode) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => json_response(status, Body::from(body)),
        Err(err) => {
            error!(error = %err, intended_status = status.as_u16(), "failed to encode json response");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                Body::from(ENCODE_FAILURE_BODY),
            )
        }
    }
}

/// Answer with the standard error body.
pub fn error(message: &str, status: StatusCode) -> Response {
    with_json(
        &ErrorBody {
            error: message,
            status: status.as_u16(),
        },
        status,
    )
}

/// Answer `400` naming every invalid field.
pub fn bad_request(message: &str, failures: &ValidationFailures) -> Response {
    with_json(
        &BadRequestBody {
            error: message,
            invalid_fields: failures,
            status: StatusCode::BAD_REQUEST.as_u16(),
        },
        StatusCode::BAD_REQUEST,
    )
}

fn json_response(status: StatusCode, body: Body) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}
