//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PACHAMAMA_API_URL` - Backend base URL (default: `http://localhost:5000`)
//! - `PACHAMAMA_STATE_FILE` - File holding the persisted token and cart
//!   session (default: `.pachamama/state.json`)
//! - `PACHAMAMA_RETRY_COUNT` - Extra attempts for product writes (default: 2)
//! - `PACHAMAMA_RETRY_DELAY_MS` - Delay between write attempts (default: 1000)
//! - `PACHAMAMA_TOKEN_REFRESH_MINUTES` - Admin token staleness window (default: 25)
//! - `PACHAMAMA_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_STATE_FILE: &str = ".pachamama/state.json";
const DEFAULT_RETRY_COUNT: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_TOKEN_REFRESH_MINUTES: u64 = 25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST backend
    pub api_url: Url,
    /// Where persisted client state lives between runs
    pub state_file: PathBuf,
    /// Retry settings for authenticated product writes
    pub retry: RetrySettings,
    /// How long a validated admin token is trusted before re-checking
    pub token_refresh_window: Duration,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Retry settings for product writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_COUNT,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every other setting at its
    /// default.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            retry: RetrySettings::default(),
            token_refresh_window: Duration::from_secs(DEFAULT_TOKEN_REFRESH_MINUTES * 60),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// Unset or blank variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = parse_api_url(
            "PACHAMAMA_API_URL",
            &var("PACHAMAMA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;
        let state_file = var("PACHAMAMA_STATE_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);
        let retry = RetrySettings {
            max_retries: parsed_or_default(&var, "PACHAMAMA_RETRY_COUNT", DEFAULT_RETRY_COUNT)?,
            delay: Duration::from_millis(parsed_or_default(
                &var,
                "PACHAMAMA_RETRY_DELAY_MS",
                DEFAULT_RETRY_DELAY_MS,
            )?),
        };
        let refresh_minutes: u64 = parsed_or_default(
            &var,
            "PACHAMAMA_TOKEN_REFRESH_MINUTES",
            DEFAULT_TOKEN_REFRESH_MINUTES,
        )?;
        let timeout_secs: u64 = parsed_or_default(
            &var,
            "PACHAMAMA_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            state_file,
            retry,
            token_refresh_window: Duration::from_secs(refresh_minutes.saturating_mul(60)),
            request_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: var("SENTRY_DSN"),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
        })
    }

    /// Set the retry settings.
    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Set the token staleness window.
    #[must_use]
    pub fn with_token_refresh_window(mut self, window: Duration) -> Self {
        self.token_refresh_window = window;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the variable is not set.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset.
fn parsed_or_default<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse and validate the backend base URL.
///
/// Only `http` and `https` URLs that can carry a path are accepted.
fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http() {
        let url = parse_api_url("TEST_URL", "http://localhost:5000").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(5000));
    }

    #[test]
    fn test_parse_api_url_trims_whitespace() {
        assert!(parse_api_url("TEST_URL", "  https://api.example.com/shop/ ").is_ok());
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("TEST_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_api_url_rejects_garbage() {
        assert!(parse_api_url("TEST_URL", "not a url").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u32>("TEST_NUM", " 3 ").unwrap(), 3);
        let err = parse_value::<u32>("TEST_NUM", "three").unwrap_err();
        assert!(err.to_string().contains("TEST_NUM"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse(DEFAULT_API_URL).unwrap());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.token_refresh_window, Duration::from_secs(25 * 60));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = ClientConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.token_refresh_window, Duration::from_secs(25 * 60));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = ClientConfig::from_vars(vars(&[
            ("PACHAMAMA_API_URL", "https://api.pachamama.test"),
            ("PACHAMAMA_STATE_FILE", "/tmp/state.json"),
            ("PACHAMAMA_RETRY_COUNT", "4"),
            ("PACHAMAMA_RETRY_DELAY_MS", "250"),
            ("PACHAMAMA_TOKEN_REFRESH_MINUTES", "5"),
            ("PACHAMAMA_REQUEST_TIMEOUT_SECS", "10"),
            ("SENTRY_DSN", "https://key@sentry.test/1"),
            ("SENTRY_ENVIRONMENT", " "),
        ]))
        .unwrap();
        assert_eq!(config.api_url.host_str(), Some("api.pachamama.test"));
        assert_eq!(config.state_file, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.token_refresh_window, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.sentry_dsn.as_deref(), Some("https://key@sentry.test/1"));
        assert!(config.sentry_environment.is_none());
    }

    #[test]
    fn test_from_vars_rejects_bad_retry_count() {
        let err = ClientConfig::from_vars(vars(&[("PACHAMAMA_RETRY_COUNT", "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "PACHAMAMA_RETRY_COUNT"
        ));
    }

    #[test]
    fn test_from_vars_rejects_bad_url() {
        let err = ClientConfig::from_vars(vars(&[("PACHAMAMA_API_URL", "ftp://x.test")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new(Url::parse(DEFAULT_API_URL).unwrap())
            .with_retry(RetrySettings {
                max_retries: 5,
                delay: Duration::from_millis(10),
            })
            .with_token_refresh_window(Duration::from_secs(60));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.token_refresh_window, Duration::from_secs(60));
    }
}
