//! Wishlist actions.

use std::sync::Arc;

use tracing::{instrument, warn};

use teeshop_core::{Product, ProductId};

use super::{InFlight, require_session};
use crate::api::ApiError;
use crate::error::Result;
use crate::remote::WishlistRemote;
use crate::store::{AuthStore, EntrySnapshot, WishlistStore};

/// Wishlist actions over a backend `R`.
pub struct WishlistSync<R> {
    remote: Arc<R>,
    wishlist: WishlistStore,
    auth: AuthStore,
    in_flight: InFlight<ProductId>,
}

impl<R> Clone for WishlistSync<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            wishlist: self.wishlist.clone(),
            auth: self.auth.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<R: WishlistRemote> WishlistSync<R> {
    pub fn new(remote: Arc<R>, wishlist: WishlistStore, auth: AuthStore) -> Self {
        Self {
            remote,
            wishlist,
            auth,
            in_flight: InFlight::default(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &WishlistStore {
        &self.wishlist
    }

    /// Reload from the backend, dropping deleted products.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        require_session(&self.auth).await?;
        let wishlist = self.remote.wishlist().await?;
        self.wishlist.replace_from_entries(wishlist.products);
        Ok(())
    }

    /// Save a product. Returns `false` if it was already saved; the backend
    /// is not called then.
    ///
    /// # Errors
    ///
    /// Returns the backend error after removing the entry again.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product) -> Result<bool> {
        require_session(&self.auth).await?;
        let _guard = self.in_flight.acquire(&product.id)?;

        let snapshot = self.wishlist.snapshot(&product.id);
        if !self.wishlist.add(product.clone()) {
            return Ok(false);
        }

        let result = self.remote.add_to_wishlist(&product.id).await;
        self.settle(snapshot, result).map(|()| true)
    }

    /// Unsave a product. Returns `false` if it was not saved.
    ///
    /// # Errors
    ///
    /// Returns the backend error after restoring the entry.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<bool> {
        require_session(&self.auth).await?;
        let _guard = self.in_flight.acquire(product_id)?;

        let snapshot = self.wishlist.snapshot(product_id);
        if self.wishlist.remove_item(product_id).is_none() {
            return Ok(false);
        }

        let result = self.remote.remove_from_wishlist(product_id).await;
        self.settle(snapshot, result).map(|()| true)
    }

    /// Heart-button toggle. Returns whether the product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the entry is left as it was.
    pub async fn toggle(&self, product: &Product) -> Result<bool> {
        if self.wishlist.is_in_wishlist(&product.id) {
            self.remove(&product.id).await.map(|_| false)
        } else {
            self.add(product).await.map(|_| true)
        }
    }

    fn settle(
        &self,
        snapshot: EntrySnapshot,
        result: std::result::Result<(), ApiError>,
    ) -> Result<()> {
        let Err(e) = result else {
            return Ok(());
        };
        if matches!(e, ApiError::Unauthorized(_)) {
            self.wishlist.clear();
        } else {
            self.wishlist.restore(snapshot);
        }
        warn!(error = %e, "Wishlist update rejected, rolled back");
        Err(e.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::store::cart::tests::product;
    use crate::sync::tests::{FakeRemote, anonymous, rejected, signed_in};
    use teeshop_core::{Wishlist, WishlistEntry};

    async fn setup() -> (WishlistSync<FakeRemote>, Arc<FakeRemote>) {
        let remote = Arc::new(FakeRemote::default());
        let sync = WishlistSync::new(Arc::clone(&remote), WishlistStore::new(), signed_in().await);
        (sync, remote)
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let (sync, remote) = setup().await;
        let tee = product("A", 1000, 1);

        assert!(sync.toggle(&tee).await.unwrap());
        assert!(sync.store().is_in_wishlist(&tee.id));
        assert!(!sync.toggle(&tee).await.unwrap());
        assert!(!sync.store().is_in_wishlist(&tee.id));
        assert_eq!(remote.calls(), vec!["add_to_wishlist", "remove_from_wishlist"]);
    }

    #[tokio::test]
    async fn test_duplicate_add_skips_backend() {
        let (sync, remote) = setup().await;
        let tee = product("A", 1000, 1);

        assert!(sync.add(&tee).await.unwrap());
        assert!(!sync.add(&tee).await.unwrap());
        assert_eq!(sync.store().len(), 1);
        assert_eq!(remote.calls(), vec!["add_to_wishlist"]);
    }

    #[tokio::test]
    async fn test_failed_toggle_reverts() {
        let (sync, remote) = setup().await;
        let tee = product("A", 1000, 1);

        remote.fail_next("add_to_wishlist", rejected("Product not found"));
        assert!(sync.toggle(&tee).await.is_err());
        assert!(!sync.store().is_in_wishlist(&tee.id));

        sync.add(&tee).await.unwrap();
        remote.fail_next("remove_from_wishlist", rejected("Product not in wishlist"));
        assert!(sync.toggle(&tee).await.is_err());
        assert!(sync.store().is_in_wishlist(&tee.id));
    }

    #[tokio::test]
    async fn test_refresh_filters_deleted_products() {
        let (sync, remote) = setup().await;
        *remote.wishlist.lock().unwrap() = Wishlist {
            products: vec![
                Some(WishlistEntry {
                    product: Some(product("A", 1000, 1)),
                    added_at: None,
                }),
                Some(WishlistEntry {
                    product: Some(product("B", 1000, 1)),
                    added_at: None,
                }),
                Some(WishlistEntry {
                    product: None,
                    added_at: None,
                }),
                None,
            ],
        };

        sync.refresh().await.unwrap();

        let ids: Vec<_> = sync
            .store()
            .items()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let remote = Arc::new(FakeRemote::default());
        let sync = WishlistSync::new(Arc::clone(&remote), WishlistStore::new(), anonymous().await);
        assert!(matches!(
            sync.add(&product("A", 1000, 1)).await,
            Err(SyncError::NotAuthenticated)
        ));
    }
}
