//! Login, logout and profile actions.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, instrument, warn};

use teeshop_core::{Email, User, UserPatch};

use super::require_session;
use crate::error::{Result, SyncError};
use crate::remote::AccountRemote;
use crate::store::{AuthStore, CartStore, WishlistStore};

/// Session actions over a backend `R`.
pub struct SessionSync<R> {
    remote: Arc<R>,
    auth: AuthStore,
    cart: CartStore,
    wishlist: WishlistStore,
}

impl<R> Clone for SessionSync<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            auth: self.auth.clone(),
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
        }
    }
}

impl<R: AccountRemote> SessionSync<R> {
    pub fn new(remote: Arc<R>, auth: AuthStore, cart: CartStore, wishlist: WishlistStore) -> Self {
        Self {
            remote,
            auth,
            cart,
            wishlist,
        }
    }

    /// Log in and start a persisted session.
    ///
    /// A session that could not be written to disk still works for this
    /// process; the failure is only logged.
    ///
    /// # Errors
    ///
    /// Returns the backend error for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User> {
        let response = self.remote.login(email, password).await?;
        self.start(response.user, response.token).await
    }

    /// Create an account and log straight in.
    ///
    /// # Errors
    ///
    /// Returns the backend error, e.g. when the email is taken.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn signup(&self, name: &str, email: &Email, password: &SecretString) -> Result<User> {
        let response = self.remote.signup(name, email, password).await?;
        self.start(response.user, response.token).await
    }

    async fn start(&self, user: User, token: SecretString) -> Result<User> {
        // Mirrors of a previous account must not leak into this one.
        self.cart.clear();
        self.wishlist.clear();

        if let Err(e) = self.auth.login(user.clone(), token).await {
            warn!(error = %e, "Session is active but was not persisted");
        }
        info!(user_id = %user.id, "Session started");
        Ok(user)
    }

    /// End the session and drop the cart and wishlist mirrors.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Persist` if the stored credential could not be
    /// deleted. The in-memory session is gone either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.cart.clear();
        self.wishlist.clear();
        self.auth.logout().await?;
        Ok(())
    }

    /// Pull the profile from the backend into the session.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<User> {
        require_session(&self.auth).await?;
        let user = self.remote.profile().await?;
        self.merge(user).await
    }

    /// Save profile edits, then adopt what the backend stored.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error; the session is unchanged on failure.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: UserPatch) -> Result<User> {
        require_session(&self.auth).await?;
        if patch.is_empty() {
            return self.auth.user().ok_or(SyncError::NotAuthenticated);
        }
        let user = self.remote.update_profile(&patch).await?;
        self.merge(user).await
    }

    async fn merge(&self, user: User) -> Result<User> {
        self.auth.update_user(UserPatch::from(user)).await?;
        self.auth.user().ok_or(SyncError::NotAuthenticated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::store::auth::tests::user;
    use crate::store::cart::tests::product;
    use crate::sync::tests::{FakeRemote, anonymous, rejected};
    use teeshop_core::{CartItem, Size};

    async fn setup() -> (SessionSync<FakeRemote>, Arc<FakeRemote>) {
        let remote = Arc::new(FakeRemote::default());
        let sync = SessionSync::new(
            Arc::clone(&remote),
            anonymous().await,
            CartStore::new(),
            WishlistStore::new(),
        );
        (sync, remote)
    }

    fn email() -> Email {
        Email::parse("ayesha@example.pk").unwrap()
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let (sync, _) = setup().await;

        let user = sync
            .login(&email(), &SecretString::from("pw"))
            .await
            .unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert!(sync.auth.is_authenticated());

        sync.cart
            .add(CartItem::new(product("P1", 1000, 5), Size::Large, 1));
        sync.wishlist.add(product("A", 1000, 1));

        sync.logout().await.unwrap();
        assert!(!sync.auth.is_authenticated());
        assert!(sync.cart.is_empty());
        assert!(sync.wishlist.is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_anonymous() {
        let (sync, remote) = setup().await;
        remote.fail_next("login", rejected("Invalid credentials"));

        let err = sync
            .login(&email(), &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(!sync.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_starts_session() {
        let (sync, _) = setup().await;
        let user = sync
            .signup("Bilal", &email(), &SecretString::from("pw"))
            .await
            .unwrap();
        assert_eq!(user.name, "Bilal");
        assert!(sync.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_profile_merges() {
        let (sync, remote) = setup().await;
        sync.login(&email(), &SecretString::from("pw")).await.unwrap();

        let mut server_user = user("u1");
        server_user.address = Some("House 4, Karachi, 75500".to_string());
        *remote.user.lock().unwrap() = Some(server_user);

        let merged = sync.refresh_profile().await.unwrap();
        assert_eq!(merged.address.as_deref(), Some("House 4, Karachi, 75500"));
        assert_eq!(sync.auth.user().unwrap(), merged);
    }

    #[tokio::test]
    async fn test_update_profile_is_pessimistic() {
        let (sync, remote) = setup().await;
        sync.login(&email(), &SecretString::from("pw")).await.unwrap();

        remote.fail_next("update_profile", ApiError::Validation {
            status: 400,
            message: "Name is required".to_string(),
        });
        let patch = UserPatch {
            name: Some(String::new()),
            ..UserPatch::default()
        };
        assert!(sync.update_profile(patch).await.is_err());
        assert_eq!(sync.auth.user().unwrap().name, "Ayesha Khan");

        let patch = UserPatch {
            name: Some("Ayesha K.".to_string()),
            ..UserPatch::default()
        };
        let updated = sync.update_profile(patch).await.unwrap();
        assert_eq!(updated.name, "Ayesha K.");
        assert_eq!(sync.auth.user().unwrap().name, "Ayesha K.");
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let (sync, remote) = setup().await;
        assert!(matches!(
            sync.refresh_profile().await,
            Err(SyncError::NotAuthenticated)
        ));
        assert!(remote.calls().is_empty());
    }
}
