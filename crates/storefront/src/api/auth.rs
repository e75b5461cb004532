//! Account endpoints: signup, login, profile.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use teeshop_core::{Email, User, UserPatch};

use super::{ApiClient, ApiError};

/// Identity plus bearer credential returned by signup and login.
#[derive(Clone)]
pub struct AuthResponse {
    pub user: User,
    pub token: SecretString,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user.id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Accepts both `{ "user": {...}, "token": "..." }` and a flat user
/// document carrying a `token` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthPayload {
    Nested { user: User, token: String },
    Flat {
        #[serde(flatten)]
        user: User,
        token: String,
    },
}

impl From<AuthPayload> for AuthResponse {
    fn from(payload: AuthPayload) -> Self {
        let (user, token) = match payload {
            AuthPayload::Nested { user, token } | AuthPayload::Flat { user, token } => {
                (user, token)
            }
        };
        Self {
            user,
            token: SecretString::from(token),
        }
    }
}

impl ApiClient {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend refuses the signup
    /// (e.g. email already registered).
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn signup(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        });
        let request = self.request(Method::POST, &["users", "signup"])?.json(&body);
        self.send_json::<AuthPayload>(request).await.map(Into::into)
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::Unauthorized` on bad
    /// credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let request = self.request(Method::POST, &["users", "login"])?.json(&body);
        self.send_json::<AuthPayload>(request).await.map(Into::into)
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a valid session.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, &["users", "profile"])?;
        self.send_json(request).await
    }

    /// Update profile fields; returns the stored profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &UserPatch) -> Result<User, ApiError> {
        let request = self
            .request(Method::PUT, &["users", "profile"])?
            .json(patch);
        self.send_json(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_payload() {
        let json = r#"{"user": {"_id": "u1", "name": "Ayesha", "email": "ayesha@example.pk"}, "token": "jwt-1"}"#;
        let response: AuthResponse = serde_json::from_str::<AuthPayload>(json).unwrap().into();
        assert_eq!(response.user.id.as_str(), "u1");
        assert_eq!(response.token.expose_secret(), "jwt-1");
    }

    #[test]
    fn test_flat_payload() {
        let json = r#"{"_id": "u2", "name": "Bilal", "email": "bilal@example.pk", "isAdmin": true, "token": "jwt-2"}"#;
        let response: AuthResponse = serde_json::from_str::<AuthPayload>(json).unwrap().into();
        assert!(response.user.is_admin);
        assert_eq!(response.token.expose_secret(), "jwt-2");
    }

    #[test]
    fn test_debug_redacts_token() {
        let json = r#"{"user": {"_id": "u1", "name": "A", "email": "a@example.pk"}, "token": "super-secret"}"#;
        let response: AuthResponse = serde_json::from_str::<AuthPayload>(json).unwrap().into();
        let debug = format!("{response:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
