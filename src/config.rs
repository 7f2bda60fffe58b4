//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct,
//! then resolves that raw struct into an [`UpstreamConfig`] which is injected into the
//! upstream client at construction.

use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Parent service address used when no base is configured.
pub const DEFAULT_PARENT_BASE: &str = "https://applauncher.xyz";

/// Upstream call budget when `UPSTREAM_TIMEOUT_MS` is not set.
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `PARENT_API_BASE` (optional): preferred parent service base address
/// - `NEXT_PUBLIC_PARENT_API_BASE` (optional): second candidate
/// - `PARENT_BASE_URL` (optional): third candidate
/// - `PARENT_BALANCE_PATH` (optional): balance endpoint override (e.g. `/api/credits/balance-read`)
/// - `UPSTREAM_TIMEOUT_MS` (optional): upstream call budget, defaults to 8000
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub parent_api_base: Option<String>,
    pub next_public_parent_api_base: Option<String>,
    pub parent_base_url: Option<String>,
    pub parent_balance_path: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub upstream_timeout_ms: u64,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Errors raised while turning the raw environment into an [`UpstreamConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid parent base address {base:?}: {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream timeout must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into expected types.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: parent_api_base -> PARENT_API_BASE
        Ok(envy::from_env::<Config>()?)
    }

    /// First non-empty base candidate, in precedence order.
    pub fn explicit_base(&self) -> Option<&str> {
        [
            &self.parent_api_base,
            &self.next_public_parent_api_base,
            &self.parent_base_url,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
    }

    /// Resolve the raw settings into the config the upstream client is built from.
    pub fn resolve(&self) -> Result<UpstreamConfig, ConfigError> {
        let raw = self.explicit_base().unwrap_or(DEFAULT_PARENT_BASE);
        let tidy = tidy_base(raw);
        let base_url = Url::parse(&tidy).map_err(|source| ConfigError::InvalidBase {
            base: raw.to_string(),
            source,
        })?;

        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let balance_path = self
            .parent_balance_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{}", p.trim_start_matches('/')));

        Ok(UpstreamConfig {
            base_url,
            timeout: Duration::from_millis(self.upstream_timeout_ms),
            balance_path,
            explicit_base: self.explicit_base().is_some(),
        })
    }
}

/// Strip trailing slashes, then a trailing `/api` segment that operators sometimes
/// include in the base even though every upstream path already starts with it.
pub fn tidy_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}

/// Resolved upstream settings, injected into [`crate::upstream::UpstreamClient`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Parent base address without trailing slash or `/api` suffix
    pub base_url: Url,

    /// Budget for a single upstream call, including reading the body
    pub timeout: Duration,

    /// Replaces the adapter table's balance path when set
    pub balance_path: Option<String>,

    /// False when the base came from [`DEFAULT_PARENT_BASE`]
    pub explicit_base: bool,
}

impl UpstreamConfig {
    /// Config pointing at a specific parent, mainly for tests.
    pub fn for_base(base: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Config {
            parent_api_base: Some(base.to_string()),
            upstream_timeout_ms: timeout.as_millis() as u64,
            ..Default::default()
        }
        .resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_candidate_wins() {
        let config = Config {
            parent_api_base: Some("   ".into()),
            next_public_parent_api_base: Some("https://second.example".into()),
            parent_base_url: Some("https://third.example".into()),
            upstream_timeout_ms: DEFAULT_TIMEOUT_MS,
            ..Default::default()
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.base_url.as_str(), "https://second.example/");
        assert!(resolved.explicit_base);
    }

    #[test]
    fn falls_back_to_default_base() {
        let config = Config {
            upstream_timeout_ms: DEFAULT_TIMEOUT_MS,
            ..Default::default()
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.base_url.as_str(), "https://applauncher.xyz/");
        assert!(!resolved.explicit_base);
        assert_eq!(resolved.timeout, Duration::from_secs(8));
    }

    #[test]
    fn tidy_base_strips_slashes_and_api_suffix() {
        assert_eq!(tidy_base("https://p.example///"), "https://p.example");
        assert_eq!(tidy_base("https://p.example/api/"), "https://p.example");
        assert_eq!(tidy_base("https://p.example/v2/api"), "https://p.example/v2");
        assert_eq!(tidy_base("https://p.example/apis"), "https://p.example/apis");
    }

    #[test]
    fn balance_path_override_is_normalized() {
        let config = Config {
            parent_balance_path: Some("api/credits/balance-read".into()),
            upstream_timeout_ms: DEFAULT_TIMEOUT_MS,
            ..Default::default()
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(
            resolved.balance_path.as_deref(),
            Some("/api/credits/balance-read")
        );
    }

    #[test]
    fn rejects_unparseable_base_and_zero_timeout() {
        let bad_base = Config {
            parent_api_base: Some("not a url".into()),
            upstream_timeout_ms: DEFAULT_TIMEOUT_MS,
            ..Default::default()
        };
        assert!(matches!(
            bad_base.resolve(),
            Err(ConfigError::InvalidBase { .. })
        ));

        let zero = Config::default();
        assert!(matches!(zero.resolve(), Err(ConfigError::ZeroTimeout)));
    }
}
