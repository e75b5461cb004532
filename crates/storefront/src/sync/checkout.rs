//! Checkout, order history and ratings.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use teeshop_core::{NewOrder, NewOrderLine, Order, OrderId, ProductId, Rating, ShippingAddress};

use super::require_session;
use crate::error::{Result, SyncError};
use crate::remote::{CartRemote, OrderRemote};
use crate::store::{AuthStore, CartStore};

/// Order actions over a backend `R`.
pub struct CheckoutSync<R> {
    remote: Arc<R>,
    cart: CartStore,
    auth: AuthStore,
}

impl<R> Clone for CheckoutSync<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            cart: self.cart.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<R: OrderRemote + CartRemote> CheckoutSync<R> {
    pub fn new(remote: Arc<R>, cart: CartStore, auth: AuthStore) -> Self {
        Self { remote, cart, auth }
    }

    /// Place an order for everything in the cart.
    ///
    /// The cart is cleared only once the backend has accepted the order.
    /// If the order went through but clearing the server cart failed, the
    /// order is still returned and the local cart is still cleared.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated`, `SyncError::EmptyCart` or
    /// `SyncError::IncompleteAddress` before any request, or the backend
    /// error (cart untouched).
    #[instrument(skip(self, address))]
    pub async fn place_order(&self, address: &ShippingAddress) -> Result<Order> {
        require_session(&self.auth).await?;

        let items = self.cart.items();
        if items.is_empty() {
            return Err(SyncError::EmptyCart);
        }
        if address.is_incomplete() {
            return Err(SyncError::IncompleteAddress);
        }

        let order = NewOrder {
            products: items
                .iter()
                .map(|item| NewOrderLine {
                    product_id: item.product.id.clone(),
                    size: item.size,
                    quantity: item.quantity,
                })
                .collect(),
            address: address.to_line(),
        };

        let placed = self.remote.create_order(&order).await?;
        info!(order_id = %placed.id, total = %placed.total_amount, "Order placed");

        if let Err(e) = self.remote.clear_cart().await {
            warn!(order_id = %placed.id, error = %e, "Order placed but server cart was not cleared");
        }
        self.cart.clear();
        Ok(placed)
    }

    /// The user's orders.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>> {
        require_session(&self.auth).await?;
        Ok(self.remote.orders().await?)
    }

    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without a session, or the
    /// backend error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order> {
        require_session(&self.auth).await?;
        Ok(self.remote.order(id).await?)
    }

    /// Rate a product of a delivered order with 1 to 5 stars.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidRating`, `SyncError::NotRateable` or
    /// `SyncError::NotInOrder` before any request, or the backend error.
    #[instrument(skip(self, order), fields(order_id = %order.id, product_id = %product_id))]
    pub async fn rate(&self, order: &Order, product_id: &ProductId, stars: u8) -> Result<()> {
        require_session(&self.auth).await?;

        let rating = Rating::new(stars).map_err(SyncError::InvalidRating)?;
        if !order.status.allows_rating() {
            return Err(SyncError::NotRateable(order.status));
        }
        if !order.products.iter().any(|line| &line.product_id == product_id) {
            return Err(SyncError::NotInOrder);
        }

        self.remote
            .rate_order_product(&order.id, product_id, rating)
            .await?;
        info!(stars, "Product rated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::cart::tests::product;
    use crate::sync::tests::{FakeRemote, anonymous, rejected, signed_in};
    use teeshop_core::{CartItem, OrderStatus, Size};

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "12 Mall Road".to_string(),
            city: "Lahore".to_string(),
            postal_code: "54000".to_string(),
        }
    }

    async fn setup() -> (CheckoutSync<FakeRemote>, Arc<FakeRemote>) {
        let remote = Arc::new(FakeRemote::default());
        let sync = CheckoutSync::new(Arc::clone(&remote), CartStore::new(), signed_in().await);
        sync.cart
            .add(CartItem::new(product("P1", 1000, 5), Size::Large, 2));
        (sync, remote)
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let (sync, remote) = setup().await;

        let order = sync.place_order(&address()).await.unwrap();

        assert_eq!(order.address, "12 Mall Road, Lahore, 54000");
        assert_eq!(order.products[0].quantity, 2);
        assert!(sync.cart.is_empty());
        assert_eq!(remote.calls(), vec!["create_order", "clear_cart"]);
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart() {
        let (sync, remote) = setup().await;
        remote.fail_next("create_order", rejected("Insufficient stock for Tee P1"));

        let err = sync.place_order(&address()).await.unwrap_err();

        assert_eq!(err.user_message(), "Insufficient stock for Tee P1");
        assert_eq!(sync.cart.item_count(), 2);
        assert_eq!(remote.calls(), vec!["create_order"]);
    }

    #[tokio::test]
    async fn test_server_clear_failure_still_returns_order() {
        let (sync, remote) = setup().await;
        remote.fail_next("clear_cart", rejected("Cart not found"));

        assert!(sync.place_order(&address()).await.is_ok());
        assert!(sync.cart.is_empty());
    }

    #[tokio::test]
    async fn test_precondition_failures_skip_backend() {
        let (sync, remote) = setup().await;
        let blank = ShippingAddress {
            city: String::new(),
            ..address()
        };
        assert!(matches!(
            sync.place_order(&blank).await,
            Err(SyncError::IncompleteAddress)
        ));

        sync.cart.clear();
        assert!(matches!(
            sync.place_order(&address()).await,
            Err(SyncError::EmptyCart)
        ));

        let anon = CheckoutSync::new(Arc::clone(&remote), CartStore::new(), anonymous().await);
        assert!(matches!(
            anon.place_order(&address()).await,
            Err(SyncError::NotAuthenticated)
        ));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rating_rules() {
        let (sync, remote) = setup().await;
        let mut order = sync.place_order(&address()).await.unwrap();
        let p1 = ProductId::new("P1");

        assert!(matches!(
            sync.rate(&order, &p1, 5).await,
            Err(SyncError::NotRateable(OrderStatus::Pending))
        ));

        order.status = OrderStatus::Delivered;
        assert!(matches!(
            sync.rate(&order, &p1, 6).await,
            Err(SyncError::InvalidRating(6))
        ));
        assert!(matches!(
            sync.rate(&order, &ProductId::new("P9"), 4).await,
            Err(SyncError::NotInOrder)
        ));

        sync.rate(&order, &p1, 4).await.unwrap();
        assert_eq!(remote.calls().last().unwrap(), "rate_order_product");
    }

    #[tokio::test]
    async fn test_order_history() {
        let (sync, _) = setup().await;
        let placed = sync.place_order(&address()).await.unwrap();

        assert_eq!(sync.orders().await.unwrap().len(), 1);
        assert_eq!(sync.order(&placed.id).await.unwrap(), placed);
        assert!(sync.order(&OrderId::new("missing")).await.is_err());
    }
}
