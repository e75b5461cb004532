//! Wishlist payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::Product;

/// One saved product.
///
/// `product` is `None` when the referenced product has been deleted
/// server-side; such tombstones must never reach a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[serde(rename = "productId", default)]
    pub product: Option<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// The document returned by `GET /wishlist`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    #[serde(default)]
    pub products: Vec<Option<WishlistEntry>>,
}

impl Wishlist {
    /// Live products only, in server order.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.product)
            .filter(|product| !product.id.as_str().is_empty())
            .collect()
    }
}
