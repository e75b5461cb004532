//! Server cart endpoints.
//!
//! Mutation responses are not relied on: when the body parses as a cart
//! (bare or under a `cart` field) it is returned so the caller can reconcile,
//! otherwise `None`.

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use teeshop_core::{Cart, ProductId, Size};

use super::{ApiClient, ApiError};

/// Pull a cart document out of a mutation response, if it has one.
pub(crate) fn cart_from_value(value: Value) -> Option<Cart> {
    let candidate = match value {
        Value::Object(mut map) if map.contains_key("cart") => map.remove("cart")?,
        other => other,
    };
    if !candidate.get("items").is_some_and(Value::is_array) {
        return None;
    }
    serde_json::from_value(candidate)
        .map_err(|e| debug!(error = %e, "Mutation response is not a cart"))
        .ok()
}

impl ApiClient {
    /// The user's server cart. A missing cart is an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other
    /// than 404.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        let request = self.request(Method::GET, &["cart"])?;
        match self.send_json(request).await {
            Err(ApiError::NotFound(_)) => Ok(Cart::empty()),
            other => other,
        }
    }

    /// Add `quantity` of a product in `size`; the server merges lines.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the backend refuses (stock).
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError> {
        let body = serde_json::json!({
            "productId": product_id,
            "size": size,
            "quantity": quantity,
        });
        let request = self.request(Method::POST, &["cart"])?.json(&body);
        self.send_value(request).await.map(cart_from_value)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError> {
        let body = serde_json::json!({ "size": size, "quantity": quantity });
        let request = self
            .request(Method::PUT, &["cart", product_id.as_str()])?
            .json(&body);
        self.send_value(request).await.map(cart_from_value)
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub async fn remove_from_cart(
        &self,
        product_id: &ProductId,
        size: Size,
    ) -> Result<Option<Cart>, ApiError> {
        let request = self
            .request(Method::DELETE, &["cart", product_id.as_str()])?
            .query(&[("size", size.as_str())]);
        self.send_value(request).await.map(cart_from_value)
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["cart", "clear"])?;
        self.send_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_json() -> Value {
        json!({
            "items": [{
                "productId": {"_id": "p1", "name": "Tee", "price": 1200, "category": "Basic",
                              "sizes": [{"size": "Small", "stock": 3}]},
                "size": "Small",
                "quantity": 1
            }],
            "totalAmount": 1200
        })
    }

    #[test]
    fn test_bare_cart_response() {
        let cart = cart_from_value(cart_json()).unwrap();
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn test_wrapped_cart_response() {
        let cart = cart_from_value(json!({"message": "Added", "cart": cart_json()})).unwrap();
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn test_non_cart_response() {
        assert!(cart_from_value(json!({"message": "Item removed"})).is_none());
        assert!(cart_from_value(Value::Null).is_none());
        assert!(cart_from_value(json!({"items": "nope"})).is_none());
    }
}
