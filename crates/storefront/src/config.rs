//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `TEESHOP_API_URL` - Backend base URL (default: `http://localhost:5000/api`)
//! - `TEESHOP_SESSION_FILE` - Where the persisted session lives
//!   (default: `<platform data dir>/teeshop/session.json`)
//! - `TEESHOP_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `TEESHOP_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const SESSION_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No data directory available; set TEESHOP_SESSION_FILE")]
    NoDataDir,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API base URL
    pub api_url: Url,
    /// File backing the persisted auth session
    pub session_file: PathBuf,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Product cache time-to-live
    pub cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but malformed, or if no
    /// session file location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("TEESHOP_API_URL", DEFAULT_API_URL))?;
        let session_file = match get_optional_env("TEESHOP_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };
        let http_timeout = Duration::from_secs(get_secs(
            "TEESHOP_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let cache_ttl = Duration::from_secs(get_secs(
            "TEESHOP_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            session_file,
            http_timeout,
            cache_ttl,
            sentry_dsn,
        })
    }

    /// Configuration pointing at `api_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn for_api(api_url: &str, session_file: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            session_file: session_file.into(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            sentry_dsn: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds, rejecting zero.
fn get_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    let raw = get_env_or_default(key, &default.to_string());
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// Parse the API base URL and make sure relative joins stay under its path.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("TEESHOP_API_URL".to_string(), msg);

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

fn default_session_file() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("teeshop").join(SESSION_FILE_NAME))
        .ok_or(ConfigError::NoDataDir)
}
