//! Wishlist endpoints.

use reqwest::Method;
use tracing::instrument;

use teeshop_core::{ProductId, Wishlist};

use super::{ApiClient, ApiError};

impl ApiClient {
    /// The saved wishlist, tombstones included. A missing one is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other
    /// than 404.
    #[instrument(skip(self))]
    pub async fn wishlist(&self) -> Result<Wishlist, ApiError> {
        let request = self.request(Method::GET, &["wishlist"])?;
        match self.send_json(request).await {
            Err(ApiError::NotFound(_)) => Ok(Wishlist::default()),
            other => other,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["wishlist"])?
            .json(&serde_json::json!({ "productId": product_id }));
        self.send_empty(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["wishlist", product_id.as_str()])?;
        self.send_empty(request).await
    }
}
