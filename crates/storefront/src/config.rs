//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AURUM_API_BASE_URL` - Base URL of the storefront API (e.g. `https://api.aurum.example/v1`)
//!
//! ## Optional
//! - `AURUM_DATA_DIR` - Directory for local storage (default: `.aurum`)
//! - `AURUM_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `AURUM_CURRENCY` - Display currency code (default: INR)
//! - `AURUM_MAX_LINE_QUANTITY` - Quantity clamp for cart lines without a stock bound (default: 999)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use aurum_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Default clamp applied to quantity edits when a line has no stock bound.
pub const DEFAULT_MAX_LINE_QUANTITY: u32 = 999;

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
pub struct StorefrontConfig {
    /// Storefront API configuration
    pub api: ApiConfig,
    /// Directory holding the local storage files
    pub data_dir: PathBuf,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Upper bound for cart quantity edits when the stock level is unknown
    pub max_line_quantity: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Remote storefront API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative joins keep the path prefix
    pub base_url: Url,
    /// Per-request timeout enforced by the HTTP transport
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build an API configuration from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("AURUM_API_BASE_URL")?;
        let timeout_secs = get_env_or_default("AURUM_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AURUM_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let api = ApiConfig::new(&base_url, Duration::from_secs(timeout_secs))?;

        let data_dir = PathBuf::from(get_env_or_default("AURUM_DATA_DIR", ".aurum"));
        let currency = get_env_or_default("AURUM_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("AURUM_CURRENCY".to_string(), e.to_string()))?;
        let max_line_quantity = get_env_or_default(
            "AURUM_MAX_LINE_QUANTITY",
            &DEFAULT_MAX_LINE_QUANTITY.to_string(),
        )
        .parse::<u32>()
        .ok()
        .filter(|&qty| qty > 0)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "AURUM_MAX_LINE_QUANTITY".to_string(),
                "must be a positive integer".to_string(),
            )
        })?;

        Ok(Self {
            api,
            data_dir,
            currency,
            max_line_quantity,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalise the API base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("AURUM_API_BASE_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://api.aurum.example/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.aurum.example/v1/");
        assert_eq!(url.join("wishlist").unwrap().path(), "/v1/wishlist");
    }

    #[test]
    fn test_parse_base_url_keeps_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/api/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_non_http() {
        let err = parse_base_url("ftp://files.example").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_api_config_new() {
        let config = ApiConfig::new("https://api.example.com", Duration::from_secs(5)).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url.host_str(), Some("api.example.com"));
    }
}
