//! Balance and earnings read handlers.
//!
//! - GET /api/credits/balance?userId=..&projectId=.. - identifiers in the query
//! - POST /api/credits/balance - identifiers in a JSON body
//!
//! The parent answers with either a credit balance or a creator earnings summary. The
//! body is forwarded byte for byte with its content type; the detected shape is reported
//! in the `x-balance-shape` header.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    handlers::{dispatch, parse_json_body, passthrough, query_pairs},
    models::{
        balance::BalancePayload,
        identity::{self, IdentitySource},
    },
    upstream::{ForwardedHeaders, Operation, UpstreamRequest, route},
};

const X_BALANCE_SHAPE: HeaderName = HeaderName::from_static("x-balance-shape");

/// Read a balance with identifiers in the query string.
///
/// # Response
///
/// - **Success**: the parent's body and status, unchanged
/// - **Error (400)**: no project id under any accepted alias
/// - **Error (502/504)**: parent unreachable or too slow
pub async fn read_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let source = IdentitySource::from_query(query_pairs(query.as_deref()));

    fetch_balance(&state, &headers, source).await
}

/// Read a balance with identifiers in a JSON body.
///
/// ```json
/// { "userId": "u_123", "projectId": "p_456" }
/// ```
pub async fn read_balance_from_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, AppError> {
    let body = parse_json_body(&body)?;
    let source = IdentitySource::from_query(query_pairs(query.as_deref())).with_body(&body);

    fetch_balance(&state, &headers, source).await
}

async fn fetch_balance(
    state: &AppState,
    headers: &HeaderMap,
    source: IdentitySource,
) -> Result<Response, AppError> {
    // A project is enough for display; the parent gates earnings on the user.
    let scope = identity::normalize_project(&source)?;
    let route = route(Operation::Balance);

    tracing::info!(
        operation = %route.operation,
        project_id = %scope.project_id,
        has_user = scope.user_id.is_some(),
        "request validated"
    );

    let request = UpstreamRequest::new(route, ForwardedHeaders::from_inbound(headers))
        .with_query(route.identity_query(scope.user_id.as_deref(), &scope.project_id));

    let raw = dispatch(state, request).await?;

    let shape = BalancePayload::classify(&raw.body).shape();
    tracing::debug!(project_id = %scope.project_id, shape, "balance payload classified");

    let mut response = passthrough(raw);
    response
        .headers_mut()
        .insert(X_BALANCE_SHAPE, HeaderValue::from_static(shape));

    Ok(response)
}
