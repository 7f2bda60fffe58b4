//! HTTP client for the parent service.
//!
//! Every call is bounded by the configured timeout. Dropping the request future on expiry
//! aborts the in-flight connection, and a response that arrives afterwards is discarded.
//! Non-2xx responses are not errors at this layer: status and body are handed back intact
//! so the caller can decide between pass-through and translation.

use axum::body::Bytes;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, HOST, HeaderMap, HeaderName, HeaderValue, ORIGIN,
};
use reqwest::{StatusCode, redirect};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::upstream::routes::{Operation, Route};

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_ORIGIN: HeaderName = HeaderName::from_static("x-forwarded-origin");
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Failures talking to the parent before a complete response was received.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("cannot build upstream url: {0}")]
    InvalidUrl(String),
}

/// Headers carried from the inbound request to the parent.
///
/// `authorization` and `cookie` are copied byte for byte; the gateway never inspects them.
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeaders {
    authorization: Option<HeaderValue>,
    cookie: Option<HeaderValue>,
    forwarded_host: Option<HeaderValue>,
    origin: Option<HeaderValue>,
    request_id: Option<HeaderValue>,
}

impl ForwardedHeaders {
    pub fn from_inbound(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .cloned()
            .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

        Self {
            authorization: headers.get(AUTHORIZATION).cloned(),
            cookie: headers.get(COOKIE).cloned(),
            forwarded_host: headers
                .get(X_FORWARDED_HOST)
                .or_else(|| headers.get(HOST))
                .cloned(),
            origin: headers.get(ORIGIN).cloned(),
            request_id,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_ref().and_then(|v| v.to_str().ok())
    }

    /// Diagnostics go in first so identity headers are always the last write.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let diagnostics = [
            (X_FORWARDED_HOST, &self.forwarded_host),
            (X_FORWARDED_ORIGIN, &self.origin),
            (X_REQUEST_ID, &self.request_id),
        ];
        for (name, value) in diagnostics {
            if let Some(value) = value {
                map.insert(name, value.clone());
            }
        }

        if let Some(auth) = &self.authorization {
            map.insert(AUTHORIZATION, auth.clone());
        }
        if let Some(cookie) = &self.cookie {
            map.insert(COOKIE, cookie.clone());
        }

        map
    }
}

/// One call to the parent, built from an adapter table entry.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub route: &'static Route,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: ForwardedHeaders,
}

impl UpstreamRequest {
    pub fn new(route: &'static Route, headers: ForwardedHeaders) -> Self {
        Self {
            route,
            query: Vec::new(),
            body: None,
            headers,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A complete parent response, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Shared, cheaply clonable parent client.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            // A followed redirect would re-issue the call against another location.
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Path for a route, honoring the configured balance override.
    pub fn path_for<'a>(&'a self, route: &'a Route) -> &'a str {
        match (&route.operation, &self.config.balance_path) {
            (Operation::Balance, Some(path)) => path.as_str(),
            _ => route.path,
        }
    }

    /// Full parent URL: base path prefix, route path and query pairs.
    pub fn url_for(&self, route: &Route, query: &[(String, String)]) -> Result<Url, UpstreamError> {
        let mut url = self.config.base_url.clone();
        if url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(url.to_string()));
        }

        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{}", self.path_for(route)));
        url.set_query(None);

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    /// Execute one call. Never retried here.
    pub async fn call(&self, request: UpstreamRequest) -> Result<RawResponse, UpstreamError> {
        let url = self.url_for(request.route, &request.query)?;
        let operation = request.route.operation;

        let mut builder = self
            .http
            .request(request.route.verb.method(), url.clone())
            .headers(request.headers.to_header_map());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(%operation, url = %url, "calling parent service");
        let started = Instant::now();

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>(RawResponse {
                status,
                content_type,
                body,
            })
        };

        let result = match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) if e.is_timeout() => Err(UpstreamError::Timeout(self.config.timeout)),
            Ok(Err(e)) => Err(UpstreamError::Unreachable(e)),
            Err(_) => Err(UpstreamError::Timeout(self.config.timeout)),
        };

        match &result {
            Ok(raw) => tracing::debug!(
                %operation,
                status = raw.status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "parent service responded"
            ),
            Err(e) => tracing::warn!(
                %operation,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "parent service call failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::routes::route;

    fn client(base: &str) -> UpstreamClient {
        let config = UpstreamConfig::for_base(base, Duration::from_secs(1)).unwrap();
        UpstreamClient::new(config).unwrap()
    }

    #[test]
    fn url_keeps_base_prefix_and_appends_query() {
        let client = client("https://parent.example/tenant/api/");
        let url = client
            .url_for(
                route(Operation::Transactions),
                &route(Operation::Transactions).identity_query(Some("u 1"), "p1"),
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://parent.example/tenant/api/credits/transactions?userId=u+1&projectId=p1&all=true"
        );
    }

    #[test]
    fn balance_override_replaces_table_path() {
        let mut config = UpstreamConfig::for_base("https://parent.example", Duration::from_secs(1)).unwrap();
        config.balance_path = Some("/api/credits/balance-read".into());
        let client = UpstreamClient::new(config).unwrap();

        assert_eq!(client.path_for(route(Operation::Balance)), "/api/credits/balance-read");
        assert_eq!(client.path_for(route(Operation::Checkout)), "/api/credits/checkout");
    }

    #[test]
    fn identity_headers_are_forwarded_verbatim() {
        let mut inbound = HeaderMap::new();
        inbound.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        inbound.insert(COOKIE, HeaderValue::from_static("session=xyz; theme=dark"));
        inbound.insert(HOST, HeaderValue::from_static("app.example"));
        inbound.insert(X_REQUEST_ID, HeaderValue::from_static("req-42"));

        let out = ForwardedHeaders::from_inbound(&inbound).to_header_map();

        assert_eq!(out[AUTHORIZATION], "Bearer abc");
        assert_eq!(out[COOKIE], "session=xyz; theme=dark");
        assert_eq!(out[X_FORWARDED_HOST], "app.example");
        assert_eq!(out[X_REQUEST_ID], "req-42");
        assert_eq!(out[ACCEPT], "application/json");
        assert!(out.get(HOST).is_none());
    }

    #[test]
    fn missing_identity_headers_are_not_invented() {
        let forwarded = ForwardedHeaders::from_inbound(&HeaderMap::new());
        let out = forwarded.to_header_map();

        assert!(out.get(AUTHORIZATION).is_none());
        assert!(out.get(COOKIE).is_none());
        assert!(forwarded.request_id().is_some());
    }
}
