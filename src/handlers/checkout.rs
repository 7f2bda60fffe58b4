//! Checkout session handler.
//!
//! - POST /api/credits/checkout
//! - POST /api/create-payment (older generated clients)

use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::HeaderMap,
};
use serde::Serialize;

use crate::{
    AppState,
    error::AppError,
    handlers::{dispatch, parse_json_body, query_pairs},
    models::{
        checkout::{CheckoutRequest, checkout_url},
        identity::{self, IdentitySource},
    },
    upstream::{ForwardedHeaders, Operation, UpstreamRequest, route},
};

/// Response returned when the parent created a session.
#[derive(Debug, Serialize)]
pub struct CheckoutSession {
    pub success: bool,

    /// Parent-issued redirect, unchanged
    pub url: String,
}

/// Create a checkout session.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": "u_123",
///   "project_id": "p_456",
///   "amount": 9.99,
///   "type": "subscription",
///   "tier": "pro-monthly",
///   "interval": "month",
///   "intervalCount": 1
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "success": true, "url": "https://checkout..." }`
/// - **Error (400)**: missing identifiers or invalid amount/cadence
/// - **Error (parent status)**: `{ "error": "Failed to create checkout session" }`; the
///   parent's body is only logged
///
/// # Duplicates
///
/// The parent call is made once. A timeout is reported as 504 and never retried here,
/// since the session may have been created.
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<CheckoutSession>, AppError> {
    let body = parse_json_body(&body)?;
    let source = IdentitySource::from_query(query_pairs(query.as_deref())).with_body(&body);
    let identity = identity::normalize(&source)?;

    let checkout = CheckoutRequest::from_body(&body)?;
    let product = checkout.descriptor()?;
    let route = route(Operation::Checkout);

    tracing::info!(
        operation = %route.operation,
        user_id = %identity.user_id,
        project_id = %identity.project_id,
        kind = ?checkout.kind,
        price_cents = product.price_cents,
        "request validated"
    );

    let upstream_body = checkout.upstream_body(route.identity_fields(&identity), &product);
    let request = UpstreamRequest::new(route, ForwardedHeaders::from_inbound(&headers))
        .with_body(upstream_body);

    let raw = dispatch(&state, request).await?;

    let url = raw
        .json()
        .ok()
        .as_ref()
        .and_then(checkout_url)
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::UpstreamMalformed(format!(
                "checkout response without url: {}",
                String::from_utf8_lossy(&raw.body)
            ))
        })?;

    Ok(Json(CheckoutSession { success: true, url }))
}
