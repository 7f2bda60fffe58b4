//! Transaction history handler.
//!
//! - GET /api/credits/transactions?userId=..&projectId=..

use axum::{
    Json,
    extract::{RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    error::AppError,
    handlers::{dispatch, query_pairs},
    models::{
        identity::{self, IdentitySource},
        transaction::with_fallback_total,
    },
    upstream::{ForwardedHeaders, Operation, UpstreamRequest, route},
};

/// List the full transaction history of a project for a user.
///
/// # Response (200)
///
/// ```json
/// {
///   "transactions": [
///     { "id": "tx_1", "amountCents": 500, "status": "completed", "createdAt": "..." },
///     { "id": "tx_2", "amountCents": 300, "status": "pending", "createdAt": "..." }
///   ],
///   "totalEarnedCents": 500,
///   "totalEarnedComputed": true
/// }
/// ```
///
/// `totalEarnedCents` comes from the parent when it sends one. Otherwise it is summed
/// over completed records here and flagged with `totalEarnedComputed`.
///
/// # Security
///
/// Access to the history is enforced by the parent; a 403 from it is returned as 403.
pub async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let source = IdentitySource::from_query(query_pairs(query.as_deref()));
    let identity = identity::normalize(&source)?;
    let route = route(Operation::Transactions);

    tracing::info!(
        operation = %route.operation,
        user_id = %identity.user_id,
        project_id = %identity.project_id,
        "request validated"
    );

    let request = UpstreamRequest::new(route, ForwardedHeaders::from_inbound(&headers))
        .with_query(route.identity_query(Some(&identity.user_id), &identity.project_id));

    let raw = dispatch(&state, request).await?;

    let body = raw
        .json()
        .map_err(|e| AppError::UpstreamMalformed(format!("transactions body: {e}")))?;

    Ok((raw.status, Json(with_fallback_total(body))).into_response())
}
