//! Cart actions.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use teeshop_core::{Cart, CartItem, CartKey, Product, ProductId, Size};

use super::{InFlight, require_session};
use crate::api::ApiError;
use crate::error::{Result, SyncError};
use crate::remote::CartRemote;
use crate::store::{AuthStore, CartStore, LineSnapshot};

/// Cart actions over a backend `R`.
pub struct CartSync<R> {
    remote: Arc<R>,
    cart: CartStore,
    auth: AuthStore,
    in_flight: InFlight<CartKey>,
}

impl<R> Clone for CartSync<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            cart: self.cart.clone(),
            auth: self.auth.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<R: CartRemote> CartSync<R> {
    pub fn new(remote: Arc<R>, cart: CartStore, auth: AuthStore) -> Self {
        Self {
            remote,
            cart,
            auth,
            in_flight: InFlight::default(),
        }
    }

    /// The local mirror.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.cart
    }

    /// Reload the mirror from the backend. A missing cart loads as empty.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        require_session(&self.auth).await?;
        let cart = self.remote.cart().await?;
        debug!(lines = cart.items.len(), "Cart loaded");
        let pending = self.in_flight.others(None);
        self.cart.reconcile(cart.items, cart.total_amount, &pending);
        Ok(())
    }

    /// Add `quantity` of `product` in `size`.
    ///
    /// Stock is checked against what is already in the cart before anything
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns a stock or quantity error without touching state, or the
    /// backend error after rolling the line back.
    #[instrument(skip(self, product), fields(product_id = %product.id, size = %size))]
    pub async fn add(&self, product: &Product, size: Size, quantity: u32) -> Result<()> {
        require_session(&self.auth).await?;
        if quantity < 1 {
            return Err(SyncError::InvalidQuantity);
        }

        let key = CartKey::new(product.id.clone(), size);
        let available = product.stock_for(size);
        if available == 0 {
            return Err(SyncError::OutOfStock { size });
        }
        let in_cart = self.cart.get(&key).map_or(0, |line| line.quantity);
        let requested = in_cart.saturating_add(quantity);
        if requested > available {
            return Err(SyncError::InsufficientStock {
                requested,
                available,
            });
        }

        let _guard = self.in_flight.acquire(&key)?;
        let snapshot = self.cart.snapshot_line(&key);
        self.cart
            .add(CartItem::new(product.clone(), size, quantity));

        let result = self
            .remote
            .add_to_cart(&product.id, size, quantity)
            .await;
        self.settle(snapshot, result)
    }

    /// Set a line's quantity.
    ///
    /// Returns `false` when the line is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidQuantity` for zero,
    /// `SyncError::InsufficientStock` above the line's stock, or the backend
    /// error after restoring the old quantity.
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<bool> {
        require_session(&self.auth).await?;
        if quantity < 1 {
            return Err(SyncError::InvalidQuantity);
        }

        let key = CartKey::new(product_id.clone(), size);
        let Some(line) = self.cart.get(&key) else {
            return Ok(false);
        };
        let available = line.available_stock();
        if quantity > available {
            return Err(SyncError::InsufficientStock {
                requested: quantity,
                available,
            });
        }
        if quantity == line.quantity {
            return Ok(true);
        }

        let _guard = self.in_flight.acquire(&key)?;
        let snapshot = self.cart.snapshot_line(&key);
        self.cart.update_quantity(product_id, size, quantity)?;

        let result = self
            .remote
            .update_cart_item(product_id, size, quantity)
            .await;
        self.settle(snapshot, result).map(|()| true)
    }

    /// Remove a line. Returns `false` when it was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns the backend error after putting the line back.
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub async fn remove(&self, product_id: &ProductId, size: Size) -> Result<bool> {
        require_session(&self.auth).await?;

        let key = CartKey::new(product_id.clone(), size);
        let _guard = self.in_flight.acquire(&key)?;
        let snapshot = self.cart.snapshot_line(&key);
        if self.cart.remove_item(product_id, size).is_none() {
            return Ok(false);
        }

        let result = self.remote.remove_from_cart(product_id, size).await;
        self.settle(snapshot, result).map(|()| true)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InFlight`] while any line is still syncing, or
    /// the backend error after restoring the previous contents.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        require_session(&self.auth).await?;

        let _guard = self.in_flight.acquire_all()?;
        let items = self.cart.items();
        let total = self.cart.total_amount();
        self.cart.clear();

        if let Err(e) = self.remote.clear_cart().await {
            self.compensate(&e, || self.cart.replace(items, total));
            return Err(e.into());
        }
        Ok(())
    }

    /// Commit on success, restore the line on failure. A server cart is
    /// adopted except for lines other requests still have in flight.
    fn settle(
        &self,
        snapshot: LineSnapshot,
        result: std::result::Result<Option<Cart>, ApiError>,
    ) -> Result<()> {
        match result {
            Ok(Some(server)) => {
                let pending = self.in_flight.others(Some(snapshot.key()));
                self.cart
                    .reconcile(server.items, server.total_amount, &pending);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let key = snapshot.key().clone();
                self.compensate(&e, || self.cart.restore_line(snapshot));
                warn!(key = %key, error = %e, "Cart update rejected, rolled back");
                Err(e.into())
            }
        }
    }

    /// Undo a local change. A dead session takes the whole mirror with it.
    fn compensate(&self, err: &ApiError, rollback: impl FnOnce()) {
        if matches!(err, ApiError::Unauthorized(_)) {
            self.cart.clear();
        } else {
            rollback();
        }
    }
}
