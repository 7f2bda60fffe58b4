//! HTTP request handlers (route handlers).
//!
//! Each operation handler:
//! 1. Normalizes identifiers from the query string and/or JSON body
//! 2. Validates operation-specific input, failing before any upstream call
//! 3. Dispatches exactly one call to the parent through the adapter table
//! 4. Passes the parent's answer through, or lets [`AppError`] translate the failure

/// Balance and earnings reads
pub mod balance;
/// Checkout session creation
pub mod checkout;
/// Check-and-debit
pub mod debit;
/// Liveness endpoints
pub mod health;
/// Transaction history
pub mod transactions;

use axum::{
    Json,
    body::Bytes,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::{
    AppState,
    error::{AppError, ErrorBody},
    upstream::{RawResponse, UpstreamRequest},
};

/// Decode a raw query string into pairs. Malformed pairs are decoded leniently.
pub(crate) fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Parse a request body as a JSON object. An empty body is an empty object.
pub(crate) fn parse_json_body(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::validation("Request body must be a JSON object")),
        Err(_) => Err(AppError::validation("Invalid JSON body")),
    }
}

/// Send one request to the parent and keep only 2xx answers.
///
/// Non-2xx answers are logged with their body and turned into
/// [`AppError::UpstreamRejected`] using the route's message and exposure policy.
pub(crate) async fn dispatch(
    state: &AppState,
    request: UpstreamRequest,
) -> Result<RawResponse, AppError> {
    let route = request.route;
    let request_id = request.headers.request_id().map(str::to_owned);

    tracing::info!(
        operation = %route.operation,
        request_id = request_id.as_deref().unwrap_or("-"),
        "request dispatched"
    );

    let raw = state.upstream.call(request).await?;

    if raw.status.is_success() {
        tracing::info!(
            operation = %route.operation,
            status = raw.status.as_u16(),
            "request succeeded"
        );
        return Ok(raw);
    }

    tracing::warn!(
        operation = %route.operation,
        status = raw.status.as_u16(),
        body = %String::from_utf8_lossy(&raw.body),
        "parent rejected request"
    );

    Err(AppError::rejected(
        raw.status,
        &raw.body,
        route.failure_message,
        route.expose_upstream_detail,
    ))
}

/// Return the parent's body byte for byte with its status and content type.
pub(crate) fn passthrough(raw: RawResponse) -> Response {
    let content_type = raw
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    (raw.status, [(CONTENT_TYPE, content_type)], raw.body).into_response()
}

/// Existence probe: `204 No Content`, no body, no upstream call.
pub async fn probe() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
            details: None,
        }),
    )
}

pub async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method not allowed".to_string(),
            details: None,
        }),
    )
}
