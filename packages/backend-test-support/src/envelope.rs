//! Assertions for the backend's JSON response envelope, written against
//! raw response parts so they do not depend on backend types.

use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ErrorEnvelopeLike {
    success: bool,
    message: String,
    #[serde(default)]
    errors: Option<Value>,
}

/// Parse a body as JSON, panicking with the raw text when it is not.
pub fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "response body is not JSON ({e}): {}",
            String::from_utf8_lossy(body)
        )
    })
}

/// Assert an error response: expected status, `success: false`, a message
/// containing `message_contains` when given, and an `x-trace-id` header.
///
/// Returns the `errors` object, if the response carried one.
pub fn assert_error_envelope(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    expected_status: StatusCode,
    message_contains: Option<&str>,
) -> Option<Value> {
    assert_eq!(
        status,
        expected_status,
        "unexpected status; body: {}",
        String::from_utf8_lossy(body)
    );

    let envelope: ErrorEnvelopeLike = serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "body is not an error envelope ({e}): {}",
            String::from_utf8_lossy(body)
        )
    });
    assert!(!envelope.success, "error envelope must have success=false");
    assert!(!envelope.message.is_empty(), "error message must not be empty");
    if let Some(fragment) = message_contains {
        assert!(
            envelope.message.contains(fragment),
            "message {:?} does not contain {:?}",
            envelope.message,
            fragment
        );
    }

    let trace_id = headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(!trace_id.is_empty(), "x-trace-id header must be present");

    envelope.errors
}

/// Assert a success response and return its `data` member (`Null` when absent).
pub fn assert_success_envelope(status: StatusCode, body: &[u8], expected_status: StatusCode) -> Value {
    assert_eq!(
        status,
        expected_status,
        "unexpected status; body: {}",
        String::from_utf8_lossy(body)
    );

    let value = json_body(body);
    assert_eq!(value["success"], Value::Bool(true), "body: {value}");
    value.get("data").cloned().unwrap_or(Value::Null)
}
