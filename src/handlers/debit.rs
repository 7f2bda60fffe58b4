//! Check-and-debit handler.
//!
//! - POST /api/credits/check-and-debit

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    handlers::{dispatch, parse_json_body, passthrough, query_pairs},
    models::{
        debit::DebitRequest,
        identity::{self, IdentitySource},
    },
    upstream::{ForwardedHeaders, Operation, UpstreamRequest, route},
};

/// Debit credits if the parent says the balance allows it.
///
/// # Request Body
///
/// ```json
/// {
///   "userId": "u_123",
///   "projectId": "p_456",
///   "cost": 5,
///   "metadata": { "feature": "export" }
/// }
/// ```
///
/// # Validation
///
/// - Full identity under any accepted alias
/// - `cost` is a positive integer
///
/// Both are checked before the parent is contacted.
///
/// # Response
///
/// The parent's answer is authoritative: a 2xx body is returned unchanged, anything else
/// goes through the error mapping. Timeouts are 504 and are never reported as success.
pub async fn check_and_debit(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, AppError> {
    let body = parse_json_body(&body)?;
    let source = IdentitySource::from_query(query_pairs(query.as_deref())).with_body(&body);
    let identity = identity::normalize(&source)?;
    let debit = DebitRequest::from_body(identity, &body)?;
    let route = route(Operation::CheckAndDebit);

    tracing::info!(
        operation = %route.operation,
        user_id = %debit.identity.user_id,
        project_id = %debit.identity.project_id,
        cost = debit.cost,
        "request validated"
    );

    let upstream_body = debit.upstream_body(route.identity_fields(&debit.identity));
    let request = UpstreamRequest::new(route, ForwardedHeaders::from_inbound(&headers))
        .with_body(upstream_body);

    let raw = dispatch(&state, request).await?;

    Ok(passthrough(raw))
}
