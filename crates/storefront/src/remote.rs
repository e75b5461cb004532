//! Backend operations the sync layer depends on.
//!
//! [`ApiClient`] implements all of them; tests substitute fakes.

use async_trait::async_trait;
use secrecy::SecretString;

use teeshop_core::{
    Cart, Email, NewOrder, Order, OrderId, ProductId, Rating, Size, User, UserPatch, Wishlist,
};

use crate::api::{ApiClient, ApiError, AuthResponse};

#[async_trait]
pub trait CartRemote: Send + Sync {
    async fn cart(&self) -> Result<Cart, ApiError>;

    async fn add_to_cart(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError>;

    async fn update_cart_item(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError>;

    async fn remove_from_cart(
        &self,
        product_id: &ProductId,
        size: Size,
    ) -> Result<Option<Cart>, ApiError>;

    async fn clear_cart(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait WishlistRemote: Send + Sync {
    async fn wishlist(&self) -> Result<Wishlist, ApiError>;

    async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError>;

    async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait OrderRemote: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError>;

    async fn orders(&self) -> Result<Vec<Order>, ApiError>;

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError>;

    async fn rate_order_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        rating: Rating,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AccountRemote: Send + Sync {
    async fn signup(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError>;

    async fn login(&self, email: &Email, password: &SecretString)
    -> Result<AuthResponse, ApiError>;

    async fn profile(&self) -> Result<User, ApiError>;

    async fn update_profile(&self, patch: &UserPatch) -> Result<User, ApiError>;
}

/// Everything the storefront needs from a backend.
pub trait Remote: CartRemote + WishlistRemote + OrderRemote + AccountRemote {}

impl<T: CartRemote + WishlistRemote + OrderRemote + AccountRemote> Remote for T {}

#[async_trait]
impl CartRemote for ApiClient {
    async fn cart(&self) -> Result<Cart, ApiError> {
        Self::cart(self).await
    }

    async fn add_to_cart(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError> {
        Self::add_to_cart(self, product_id, size, quantity).await
    }

    async fn update_cart_item(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError> {
        Self::update_cart_item(self, product_id, size, quantity).await
    }

    async fn remove_from_cart(
        &self,
        product_id: &ProductId,
        size: Size,
    ) -> Result<Option<Cart>, ApiError> {
        Self::remove_from_cart(self, product_id, size).await
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        Self::clear_cart(self).await
    }
}

#[async_trait]
impl WishlistRemote for ApiClient {
    async fn wishlist(&self) -> Result<Wishlist, ApiError> {
        Self::wishlist(self).await
    }

    async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        Self::add_to_wishlist(self, product_id).await
    }

    async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        Self::remove_from_wishlist(self, product_id).await
    }
}

#[async_trait]
impl OrderRemote for ApiClient {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        Self::create_order(self, order).await
    }

    async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        Self::orders(self).await
    }

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        Self::order(self, id).await
    }

    async fn rate_order_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        rating: Rating,
    ) -> Result<(), ApiError> {
        Self::rate_order_product(self, order_id, product_id, rating).await
    }
}

#[async_trait]
impl AccountRemote for ApiClient {
    async fn signup(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        Self::signup(self, name, email, password).await
    }

    async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        Self::login(self, email, password).await
    }

    async fn profile(&self) -> Result<User, ApiError> {
        Self::profile(self).await
    }

    async fn update_profile(&self, patch: &UserPatch) -> Result<User, ApiError> {
        Self::update_profile(self, patch).await
    }
}
