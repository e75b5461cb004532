//! Admin dashboard payloads.

use serde::{Deserialize, Serialize};

use super::order::Order;
use crate::types::{Price, ProductId};

/// Revenue attributed to one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: Price,
}

/// A product running low on stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub total_stock: u64,
}

/// `GET /admin/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    #[serde(default)]
    pub total_revenue: Price,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub recent_orders: Vec<Order>,
    #[serde(default)]
    pub low_stock_products: Vec<LowStockProduct>,
    #[serde(default)]
    pub revenue_by_category: Vec<CategoryRevenue>,
}

impl Analytics {
    /// Category with the highest revenue, if any.
    #[must_use]
    pub fn top_category(&self) -> Option<&CategoryRevenue> {
        self.revenue_by_category.iter().max_by_key(|c| c.revenue)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_analytics() {
        let json = r#"{
            "totalRevenue": 125000,
            "totalOrders": 42,
            "revenueByCategory": [
                {"category": "Oversized", "revenue": 80000},
                {"category": "Basic", "revenue": 45000}
            ]
        }"#;
        let analytics: Analytics = serde_json::from_str(json).unwrap();
        assert_eq!(analytics.total_orders, 42);
        assert_eq!(analytics.total_users, 0);
        assert!(analytics.recent_orders.is_empty());
        assert_eq!(analytics.top_category().unwrap().category, "Oversized");
    }
}
