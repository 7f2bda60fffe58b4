//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Parent service base the gateway forwards to
    pub upstream: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// Reports that the gateway process is serving. The parent is not contacted, so a slow
/// parent never makes the probe slow.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "upstream": "https://applauncher.xyz/",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        upstream: state.upstream.config().base_url.to_string(),
        timestamp: Utc::now(),
    })
}
