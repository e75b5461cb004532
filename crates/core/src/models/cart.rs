//! Cart lines and the cart payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::Product;
use crate::types::{CartId, CartLineId, Price, ProductId, Size, UserId};

/// Composite key of a cart line: one line per product and size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CartKey {
    pub product_id: ProductId,
    pub size: Size,
}

impl CartKey {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, size: Size) -> Self {
        Self {
            product_id: product_id.into(),
            size,
        }
    }
}

impl std::fmt::Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.product_id, self.size)
    }
}

/// One line of the cart.
///
/// The backend populates `productId` with the full product document, so
/// the line carries a display snapshot of the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartLineId>,
    #[serde(rename = "productId")]
    pub product: Product,
    pub size: Size,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl CartItem {
    /// A local line that the server has not assigned an id to yet.
    #[must_use]
    pub const fn new(product: Product, size: Size, quantity: u32) -> Self {
        Self {
            id: None,
            product,
            size,
            quantity,
            added_at: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey::new(self.product.id.clone(), self.size)
    }

    #[must_use]
    pub fn matches(&self, product_id: &ProductId, size: Size) -> bool {
        self.size == size && &self.product.id == product_id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }

    /// Stock left for this line's size, per the embedded snapshot.
    #[must_use]
    pub fn available_stock(&self) -> u32 {
        self.product.stock_for(self.size)
    }
}

/// The cart document returned by `GET /cart` and cart mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_amount: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: None,
            user_id: None,
            items: Vec::new(),
            total_amount: Price::ZERO,
            updated_at: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_populated_cart() {
        let json = r#"{
            "_id": "c1",
            "userId": "u1",
            "items": [{
                "_id": "l1",
                "productId": {"_id": "p1", "name": "Tee", "price": 1500, "imageUrl": "", "category": "Basic",
                              "sizes": [{"size": "Large", "stock": 5}]},
                "size": "Large",
                "quantity": 2,
                "addedAt": "2024-05-01T08:30:00Z"
            }],
            "totalAmount": 3000
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 1);

        let line = &cart.items[0];
        assert_eq!(line.key(), CartKey::new("p1", Size::Large));
        assert_eq!(line.line_total(), Price::from_rupees(3000));
        assert_eq!(line.available_stock(), 5);
        assert_eq!(cart.total_amount, Price::from_rupees(3000));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CartKey::new("p9", Size::ExtraLarge).to_string(), "p9/Extra Large");
    }
}
