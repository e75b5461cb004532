//! Catalog endpoints.
//!
//! Reads go through the product cache except free-text search, whose
//! result sets are too varied to be worth keeping.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use teeshop_core::{Price, Product, ProductId, Rating, Size};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError};

const DEFAULT_SHELF_LIMIT: u32 = 8;

/// Query parameters of `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl ProductQuery {
    fn cache_key(&self) -> CacheKey {
        // serde_json keeps field order, so equal queries give equal keys.
        CacheKey::Products(serde_json::to_string(self).unwrap_or_default())
    }
}

impl ApiClient {
    /// List products, optionally filtered server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let key = query.cache_key();
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let request = self.request(Method::GET, &["products"])?.query(query);
        let products: Vec<Product> = self.send_json(request).await?;
        self.remember(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(*product);
        }

        let request = self.request(Method::GET, &["products", id.as_str()])?;
        let product: Product = self.send_json(request).await?;
        self.remember(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Category(category.to_lowercase());
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let request = self.request(Method::GET, &["products", "category", category])?;
        let products: Vec<Product> = self.send_json(request).await?;
        self.remember(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Best sellers; `limit` defaults to 8.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn top_selling(&self, limit: Option<u32>) -> Result<Vec<Product>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_SHELF_LIMIT);
        self.shelf(CacheKey::TopSelling(limit), "top-selling", limit)
            .await
    }

    /// Newest products; `limit` defaults to 8.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self, limit: Option<u32>) -> Result<Vec<Product>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_SHELF_LIMIT);
        self.shelf(CacheKey::NewArrivals(limit), "new-arrivals", limit)
            .await
    }

    async fn shelf(
        &self,
        key: CacheKey,
        segment: &str,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let request = self
            .request(Method::GET, &["products", segment])?
            .query(&[("limit", limit)]);
        let products: Vec<Product> = self.send_json(request).await?;
        self.remember(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Free-text product search. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, q: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .request(Method::GET, &["products", "search"])?
            .query(&[("q", q)]);
        self.send_json(request).await
    }

    /// Rate a product directly (outside an order).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn rate_product(&self, id: &ProductId, rating: Rating) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["products", id.as_str(), "rate"])?
            .json(&serde_json::json!({ "rating": rating }));
        self.send_empty(request).await?;
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_serializes_sparse() {
        let query = ProductQuery {
            category: Some("Oversized".to_string()),
            size: Some(Size::ExtraLarge),
            ..ProductQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"category": "Oversized", "size": "Extra Large"})
        );
    }

    #[test]
    fn test_equal_queries_share_cache_key() {
        let a = ProductQuery {
            sort: Some("price".to_string()),
            ..ProductQuery::default()
        };
        let b = a.clone();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), ProductQuery::default().cache_key());
    }
}
