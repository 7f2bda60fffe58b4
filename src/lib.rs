//! Credit-ledger gateway.
//!
//! A stateless HTTP service in front of the parent accounting service. It exposes four
//! stable operations (balance read, checkout session, check-and-debit, transaction list)
//! to generated client apps and hides the parent's shifting field names, path variants
//! and response shapes behind them.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Upstream**: reqwest client with a hard per-call timeout
//! - **Format**: JSON requests/responses, parent bodies passed through where possible

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod upstream;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{balance, checkout, debit, health, probe, transactions};
use crate::upstream::UpstreamClient;

/// State shared by all handlers. Immutable, cloned per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }
}

/// Build the gateway router.
///
/// Every credit route also answers `HEAD` with `204 No Content` for clients that probe
/// whether an endpoint exists.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check).head(probe))
        .route(
            "/api/credits/balance",
            get(balance::read_balance)
                .post(balance::read_balance_from_body)
                .head(probe),
        )
        .route(
            "/api/credits/checkout",
            post(checkout::create_checkout).head(probe),
        )
        .route(
            "/api/create-payment",
            post(checkout::create_checkout).head(probe),
        )
        .route(
            "/api/credits/check-and-debit",
            post(debit::check_and_debit).head(probe),
        )
        .route(
            "/api/credits/transactions",
            get(transactions::list_transactions).head(probe),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
