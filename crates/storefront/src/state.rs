//! The storefront context shared by every front-end component.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::remote::Remote;
use crate::store::{AuthStore, CartStore, FileSessionStorage, SessionStorage, WishlistStore};
use crate::sync::{CartSync, CheckoutSync, SessionSync, WishlistSync};

/// Error building a [`Storefront`].
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("failed to create API client: {0}")]
    Api(#[from] ApiError),
}

/// One session's stores and actions.
///
/// Replaces process-wide singletons: every instance owns its own stores,
/// so tests and multiple sessions never share state. Cheaply cloneable.
pub struct Storefront<R = ApiClient> {
    inner: Arc<StorefrontInner<R>>,
}

struct StorefrontInner<R> {
    remote: Arc<R>,
    auth: AuthStore,
    cart: CartSync<R>,
    wishlist: WishlistSync<R>,
    session: SessionSync<R>,
    checkout: CheckoutSync<R>,
}

impl<R> Clone for Storefront<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Storefront<ApiClient> {
    /// Build against the configured backend, persisting the session in the
    /// configured file, and hydrate the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn open(config: &StorefrontConfig) -> std::result::Result<Self, StorefrontError> {
        let storage = Arc::new(FileSessionStorage::new(&config.session_file));
        Self::with_storage(config, storage).await
    }

    /// Like [`Storefront::open`] with a caller-chosen session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn with_storage(
        config: &StorefrontConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> std::result::Result<Self, StorefrontError> {
        let auth = AuthStore::new(storage);
        let api = ApiClient::new(config, Arc::new(auth.clone()))?;
        let storefront = Self::assemble(Arc::new(api), auth);
        storefront.inner.auth.hydrate().await;
        debug!(api_url = %config.api_url, "Storefront ready");
        Ok(storefront)
    }

    /// The raw API client, for catalog and admin calls.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.remote
    }
}

impl<R: Remote> Storefront<R> {
    /// Build around any backend. `auth` is not hydrated here.
    #[must_use]
    pub fn with_remote(remote: Arc<R>, auth: AuthStore) -> Self {
        Self::assemble(remote, auth)
    }

    fn assemble(remote: Arc<R>, auth: AuthStore) -> Self {
        let cart = CartStore::new();
        let wishlist = WishlistStore::new();
        {
            let cart = cart.clone();
            let wishlist = wishlist.clone();
            // Whichever call hits the 401, the mirrors go with the session.
            auth.on_expired(move || {
                cart.clear();
                wishlist.clear();
            });
        }
        Self {
            inner: Arc::new(StorefrontInner {
                cart: CartSync::new(Arc::clone(&remote), cart.clone(), auth.clone()),
                wishlist: WishlistSync::new(Arc::clone(&remote), wishlist.clone(), auth.clone()),
                session: SessionSync::new(
                    Arc::clone(&remote),
                    auth.clone(),
                    cart.clone(),
                    wishlist,
                ),
                checkout: CheckoutSync::new(Arc::clone(&remote), cart, auth.clone()),
                remote,
                auth,
            }),
        }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartSync<R> {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistSync<R> {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn session(&self) -> &SessionSync<R> {
        &self.inner.session
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutSync<R> {
        &self.inner.checkout
    }

    #[must_use]
    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    /// Reload cart and wishlist after login or on app start.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the other mirror may still have loaded.
    pub async fn refresh(&self) -> Result<()> {
        let (cart, wishlist) = tokio::join!(self.cart().refresh(), self.wishlist().refresh());
        cart.and(wishlist)
    }
}
