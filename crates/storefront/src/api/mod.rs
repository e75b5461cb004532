//! REST client for the shop backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for every entity; this client only
//!   reads and requests mutations
//! - Bearer credentials come from an injected [`CredentialSource`] on every
//!   request (the auth store), never from a private copy
//! - A 401 from any endpoint revokes the credential through the same source
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL by default)
//!
//! # Endpoints
//!
//! Grouped by resource in submodules, each adding methods to [`ApiClient`]:
//! `auth`, `products`, `cart`, `orders`, `wishlist`, `admin`.

mod admin;
mod auth;
mod cache;
mod cart;
mod orders;
mod products;
mod wishlist;

pub use admin::AdminOrderQuery;
pub use auth::AuthResponse;
pub use products::ProductQuery;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};

const CACHE_CAPACITY: u64 = 1000;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failed (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The credential was missing, invalid or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (non-admin on admin routes).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request (bad input, not enough stock).
    #[error("Rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend failed.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Coarse failure classes a view reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or backend trouble; retrying may help.
    Transport,
    /// Session is gone or lacks rights; send the user to login.
    Authorization,
    /// The request itself was refused; show the message inline.
    Validation,
    /// Nothing there. For cart and wishlist reads this means "empty".
    NotFound,
}

impl ApiError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorKind::Authorization,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Http(_)
            | Self::RateLimited(_)
            | Self::Server { .. }
            | Self::Parse(_)
            | Self::InvalidUrl(_) => ErrorKind::Transport,
        }
    }

    /// The backend's own `error` message, when it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation { message: m, .. }
            | Self::Server { message: m, .. } => Some(m.as_str()).filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}

/// Supplies and revokes the bearer credential.
///
/// The auth store is the only implementor outside tests, which keeps a
/// single owner for the token.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Token to attach to the next request, if a session exists.
    fn bearer_token(&self) -> Option<SecretString>;

    /// Called when the backend rejects the token (HTTP 401).
    async fn revoke(&self);
}

/// Credential source for clients that never authenticate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl CredentialSource for Anonymous {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }

    async fn revoke(&self) {}
}

/// `{ "error": "..." }` body of non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop backend REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        config: &StorefrontConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                credentials,
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the bearer credential when one exists.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = self.inner.credentials.bearer_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        Ok(builder)
    }

    /// Send and decode a JSON response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(builder).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send and return the body as loose JSON (`Null` when empty).
    ///
    /// Used by mutations whose response shape the client does not depend on.
    pub(crate) async fn send_value(
        &self,
        builder: RequestBuilder,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self.dispatch(builder).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::Null))
    }

    /// Send and discard the response body.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.dispatch(builder).await.map(drop)
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = %status, url = %response.url(), "Backend response");

        if status.is_success() {
            return Ok(response);
        }
        Err(self.error_from(response).await)
    }

    /// Map a non-2xx response onto [`ApiError`], revoking the session on 401.
    async fn error_from(&self, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(message = %message, "Credential rejected by backend, tearing down session");
                self.inner.credentials.revoke().await;
                ApiError::Unauthorized(message)
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(retry_after.unwrap_or(1)),
            s if s.is_client_error() => ApiError::Validation {
                status: s.as_u16(),
                message,
            },
            s => {
                warn!(status = %s, body = %truncate(&body, 500), "Backend returned an error");
                ApiError::Server {
                    status: s.as_u16(),
                    message,
                }
            }
        }
    }

    // =========================================================================
    // Cache
    // =========================================================================

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(key = ?key, "Cache hit");
        }
        hit
    }

    async fn remember(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop every cached catalog read.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Pick the most useful message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.error.or(parsed.message)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string();
    }
    truncate(trimmed, MAX_ERROR_BODY_CHARS)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = StorefrontConfig::for_api(base, "/tmp/unused-session.json").unwrap();
        ApiClient::new(&config, Arc::new(Anonymous)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.endpoint(&["cart"]).unwrap().as_str(),
            "http://localhost:5000/api/cart"
        );
        assert_eq!(
            api.endpoint(&["orders", "o1", "rate", "p1"]).unwrap().as_str(),
            "http://localhost:5000/api/orders/o1/rate/p1"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("http://localhost:5000/api/");
        assert_eq!(
            api.endpoint(&["products", "category", "Graphic Tees"])
                .unwrap()
                .as_str(),
            "http://localhost:5000/api/products/category/Graphic%20Tees"
        );
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Not enough stock available"}"#,
        );
        assert_eq!(msg, "Not enough stock available");

        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message": "Invalid size"}"#);
        assert_eq!(msg, "Invalid size");
    }

    #[test]
    fn test_error_message_falls_back() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "plain text failure"),
            "plain text failure"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ApiError::Unauthorized(String::new()).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            ApiError::Validation {
                status: 400,
                message: "x".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(ApiError::NotFound(String::new()).kind(), ErrorKind::NotFound);
        assert_eq!(ApiError::RateLimited(5).kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_server_message() {
        let err = ApiError::Validation {
            status: 400,
            message: "Selected size is out of stock".to_string(),
        };
        assert_eq!(err.server_message(), Some("Selected size is out of stock"));
        assert_eq!(ApiError::NotFound(String::new()).server_message(), None);
        assert_eq!(ApiError::RateLimited(1).server_message(), None);
    }
}
