//! Catalog product as served by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, Size, SizeStock};

/// A product in the catalog.
///
/// Owned by the backend and read-only to the client. Cart lines embed a
/// snapshot of it for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    pub category: String,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ratings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Stock for a size; sizes the product does not list have none.
    #[must_use]
    pub fn stock_for(&self, size: Size) -> u32 {
        self.sizes
            .iter()
            .find(|s| s.size == size)
            .map_or(0, |s| s.stock)
    }

    /// Stock summed over every size.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.sizes.iter().map(|s| u64::from(s.stock)).sum()
    }

    /// Sizes that can currently be bought.
    pub fn available_sizes(&self) -> impl Iterator<Item = Size> + '_ {
        self.sizes
            .iter()
            .filter(|s| s.is_purchasable())
            .map(|s| s.size)
    }

    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.available_sizes().next().is_none()
    }
}

/// Body for creating or updating a product from the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub category: String,
    pub image_url: String,
    pub sizes: Vec<SizeStock>,
}

impl ProductInput {
    /// Keep only the shop's three sizes, one entry each, in display order.
    ///
    /// Sizes missing from the input get zero stock.
    #[must_use]
    pub fn with_normalized_sizes(mut self) -> Self {
        self.sizes = Size::ALL
            .into_iter()
            .map(|size| SizeStock {
                size,
                stock: self
                    .sizes
                    .iter()
                    .find(|s| s.size == size)
                    .map_or(0, |s| s.stock),
            })
            .collect();
        self
    }
}
