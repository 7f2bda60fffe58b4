//! Error types and HTTP error response handling.
//!
//! This module defines the gateway's error taxonomy and how every failure is translated
//! into an HTTP response with a stable status code and a JSON body. All operation handlers
//! return `Result<_, AppError>`, so the mapping below is the only place status codes for
//! failures are decided.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::upstream::UpstreamError;

/// Gateway-wide error type.
///
/// # Error Categories
///
/// - **Validation**: caller input missing or malformed, detected before any upstream call
/// - **Timeout**: the parent did not answer within the configured budget
/// - **UpstreamUnreachable**: connection-level failure talking to the parent
/// - **UpstreamRejected**: the parent answered with a non-2xx status
/// - **UpstreamMalformed**: the parent answered 2xx with a body we cannot use
/// - **Internal**: anything else that went wrong locally
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request. The message names the offending field.
    #[error("{0}")]
    Validation(String),

    /// Returns HTTP 504 Gateway Timeout.
    #[error("Upstream timeout")]
    Timeout,

    /// Parent could not be reached (DNS, connect, reset while reading).
    ///
    /// Returns HTTP 502 Bad Gateway. The String is logged, never returned.
    #[error("Upstream unavailable")]
    UpstreamUnreachable(String),

    /// Parent responded with a non-2xx status.
    ///
    /// The status is passed through verbatim. `details` carries the parent's own error
    /// message only for operations that allow exposing it.
    #[error("{message}")]
    UpstreamRejected {
        status: StatusCode,
        message: &'static str,
        details: Option<String>,
    },

    /// Returns HTTP 502 Bad Gateway.
    #[error("Invalid upstream response")]
    UpstreamMalformed(String),

    /// Returns HTTP 500 Internal Server Error (hides details from client).
    #[error("Internal error")]
    Internal(String),
}

/// JSON body of every failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Build a rejection from a non-2xx parent response.
    ///
    /// When `expose_detail` is set, the parent's `error` (or `message`) string field is
    /// surfaced as `details`; otherwise the body stays in operator logs only.
    pub fn rejected(
        status: StatusCode,
        body: &[u8],
        message: &'static str,
        expose_detail: bool,
    ) -> Self {
        let details = expose_detail.then(|| upstream_error_message(body)).flatten();

        AppError::UpstreamRejected {
            status,
            message,
            details,
        }
    }

    /// Map this error to its status code and response body.
    pub fn translate(&self) -> (StatusCode, ErrorBody) {
        let (status, details) = match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, None),
            AppError::UpstreamUnreachable(_) => (StatusCode::BAD_GATEWAY, None),
            AppError::UpstreamRejected {
                status, details, ..
            } => (*status, details.clone()),
            AppError::UpstreamMalformed(_) => (StatusCode::BAD_GATEWAY, None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorBody {
            error: self.to_string(),
            details,
        };

        (status, body)
    }
}

/// Pull a human-readable message out of a parent error body, if it has one.
fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;

    ["error", "message"]
        .into_iter()
        .find_map(|key| value.get(key)?.as_str())
        .map(str::to_owned)
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout(_) => AppError::Timeout,
            UpstreamError::Unreachable(e) => AppError::UpstreamUnreachable(e.to_string()),
            UpstreamError::InvalidUrl(msg) => AppError::Internal(msg),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// { "error": "Upstream timeout" }
/// { "error": "Upstream request failed", "details": "Insufficient credits" }
/// ```
///
/// Local detail carried by `UpstreamUnreachable`, `UpstreamMalformed` and `Internal`
/// is logged here and dropped from the body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::UpstreamUnreachable(detail) => {
                tracing::error!(detail = %detail, "parent service unreachable")
            }
            AppError::UpstreamMalformed(detail) => {
                tracing::error!(detail = %detail, "parent service returned an unusable body")
            }
            AppError::Internal(detail) => tracing::error!(detail = %detail, "internal error"),
            AppError::Validation(reason) => tracing::debug!(reason = %reason, "request rejected"),
            _ => {}
        }

        let (status, body) = self.translate();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_status_mapping() {
        let cases = [
            (AppError::validation("Missing user_id"), 400),
            (AppError::Timeout, 504),
            (AppError::UpstreamUnreachable("connection refused".into()), 502),
            (AppError::UpstreamMalformed("missing url".into()), 502),
            (AppError::Internal("boom".into()), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.translate().0.as_u16(), expected, "{err:?}");
        }
    }

    #[test]
    fn timeout_body_has_no_details() {
        let (_, body) = AppError::Timeout.translate();
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({ "error": "Upstream timeout" })
        );
    }

    #[test]
    fn internal_detail_never_reaches_body() {
        let (_, body) = AppError::Internal("secret stack".into()).translate();
        assert_eq!(body.error, "Internal error");
        assert!(body.details.is_none());
    }

    #[test]
    fn rejection_passes_status_and_optional_detail() {
        let body = br#"{"ok":false,"error":"Insufficient credits"}"#;

        let exposed = AppError::rejected(
            StatusCode::PAYMENT_REQUIRED,
            body,
            "Upstream request failed",
            true,
        );
        let (status, out) = exposed.translate();
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(out.error, "Upstream request failed");
        assert_eq!(out.details.as_deref(), Some("Insufficient credits"));

        let hidden = AppError::rejected(
            StatusCode::FORBIDDEN,
            body,
            "Failed to create checkout session",
            false,
        );
        let (status, out) = hidden.translate();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(out.details.is_none());
    }

    #[test]
    fn rejection_tolerates_non_json_bodies() {
        let err = AppError::rejected(StatusCode::BAD_GATEWAY, b"<html>", "Upstream request failed", true);
        assert!(err.translate().1.details.is_none());
    }
}
