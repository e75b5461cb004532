//! Order endpoints.

use reqwest::Method;
use tracing::instrument;

use teeshop_core::{NewOrder, Order, OrderId, ProductId, Rating};

use super::{ApiClient, ApiError};

impl ApiClient {
    /// Place an order. The backend validates and decrements stock.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if any line is out of stock.
    #[instrument(skip(self, order), fields(lines = order.products.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let request = self.request(Method::POST, &["orders"])?.json(order);
        self.send_json(request).await
    }

    /// The user's orders, newest first as served.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, &["orders"])?;
        self.send_json(request).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let request = self.request(Method::GET, &["orders", id.as_str()])?;
        self.send_json(request).await
    }

    /// Rate a product from a delivered order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend refuses the rating.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id))]
    pub async fn rate_order_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        rating: Rating,
    ) -> Result<(), ApiError> {
        let request = self
            .request(
                Method::POST,
                &["orders", order_id.as_str(), "rate", product_id.as_str()],
            )?
            .json(&serde_json::json!({ "rating": rating }));
        self.send_empty(request).await
    }
}
