//! Cache types for catalog responses.

use teeshop_core::{Product, ProductId};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// Full listing, keyed by its encoded query string.
    Products(String),
    Category(String),
    TopSelling(u32),
    NewArrivals(u32),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
