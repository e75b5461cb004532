//! Admin console endpoints. All require an admin session; the backend
//! answers 403 otherwise.

use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use teeshop_core::{
    Analytics, Order, OrderId, OrderStatus, Product, ProductId, ProductInput, Size, User, UserId,
};

use super::{ApiClient, ApiError};

/// Query parameters of `GET /admin/orders`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminOrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn analytics(&self) -> Result<Analytics, ApiError> {
        let request = self.request(Method::GET, &["admin", "analytics"])?;
        self.send_json(request).await
    }

    /// Every order in the shop, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn admin_orders(&self, query: AdminOrderQuery) -> Result<Vec<Order>, ApiError> {
        let request = self
            .request(Method::GET, &["admin", "orders"])?
            .query(&query);
        self.send_json(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &["admin", "orders", id.as_str()])?
            .json(&serde_json::json!({ "status": status }));
        self.send_empty(request).await?;
        info!("Order status updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the input.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, &["admin", "products"])?
            .json(input);
        let product = self.send_json(request).await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the input.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::PUT, &["admin", "products", id.as_str()])?
            .json(input);
        let product = self.send_json(request).await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["admin", "products", id.as_str()])?;
        self.send_empty(request).await?;
        self.invalidate_catalog();
        info!("Product deleted");
        Ok(())
    }

    /// Set the absolute stock of one size.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id, size = %size))]
    pub async fn update_stock(&self, id: &ProductId, size: Size, stock: u32) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &["admin", "products", id.as_str(), "stock"])?
            .json(&serde_json::json!({ "size": size, "stock": stock }));
        self.send_empty(request).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        let request = self.request(Method::GET, &["admin", "users"])?;
        self.send_json(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn update_user_role(&self, id: &UserId, is_admin: bool) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &["admin", "users", id.as_str(), "role"])?
            .json(&serde_json::json!({ "isAdmin": is_admin }));
        self.send_empty(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["admin", "users", id.as_str()])?;
        self.send_empty(request).await?;
        info!("User deleted");
        Ok(())
    }
}
