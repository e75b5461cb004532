//! Client-side filtering and sorting of fetched listings.
//!
//! The product grid and the admin order table filter what they already
//! fetched instead of issuing a request per keystroke.

use std::str::FromStr;

use rust_decimal::Decimal;

use teeshop_core::{Order, OrderStatus, Price, Product, Size};

/// Upper bound of the price slider, in rupees.
pub const MAX_PRICE_RUPEES: i64 = 10_000;
const RELATED_LIMIT: usize = 4;

/// Sort order of the product grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    /// Server order.
    #[default]
    Newest,
    PriceLowToHigh,
    PriceHighToLow,
    /// Most stock first.
    Popular,
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "newest" | "new" => Ok(Self::Newest),
            "price-low" | "price-asc" | "price-low-to-high" => Ok(Self::PriceLowToHigh),
            "price-high" | "price-desc" | "price-high-to-low" => Ok(Self::PriceHighToLow),
            "popular" => Ok(Self::Popular),
            other => Err(format!("unknown sort: {other}")),
        }
    }
}

/// Filter panel state for the product grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub size: Option<Size>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub search: Option<String>,
    pub sort: ProductSort,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            size: None,
            min_price: Decimal::ZERO,
            max_price: Decimal::from(MAX_PRICE_RUPEES),
            search: None,
            sort: ProductSort::default(),
        }
    }
}

impl ProductFilter {
    /// Whether `product` passes every active criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = non_blank(self.category.as_deref())
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(size) = self.size
            && product.stock_for(size) == 0
        {
            return false;
        }
        let price = product.price.amount;
        if price < self.min_price || price > self.max_price {
            return false;
        }
        if let Some(search) = non_blank(self.search.as_deref()) {
            let needle = search.to_lowercase();
            if !product.name.to_lowercase().contains(&needle)
                && !product.category.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Filter then sort. Sorting is stable, so ties keep server order.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut result: Vec<Product> = products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();

        match self.sort {
            ProductSort::Newest => {}
            ProductSort::PriceLowToHigh => result.sort_by_key(|p| p.price),
            ProductSort::PriceHighToLow => {
                result.sort_by_key(|p| std::cmp::Reverse(p.price));
            }
            ProductSort::Popular => {
                result.sort_by_key(|p| std::cmp::Reverse(p.total_stock()));
            }
        }
        result
    }

    /// Price bounds as prices, for display.
    #[must_use]
    pub const fn price_range(&self) -> (Price, Price) {
        (Price::pkr(self.min_price), Price::pkr(self.max_price))
    }
}

/// Other products in the same category, up to four.
#[must_use]
pub fn related_products(product: &Product, catalog: &[Product]) -> Vec<Product> {
    catalog
        .iter()
        .filter(|p| p.id != product.id && p.category.eq_ignore_ascii_case(&product.category))
        .take(RELATED_LIMIT)
        .cloned()
        .collect()
}

/// Admin order table filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// `None` shows every status.
    pub status: Option<OrderStatus>,
    /// Matches order id or address, case-insensitively.
    pub search: Option<String>,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|status| order.status != status) {
            return false;
        }
        non_blank(self.search.as_deref()).is_none_or(|search| {
            let needle = search.to_lowercase();
            order.id.as_str().to_lowercase().contains(&needle)
                || order.address.to_lowercase().contains(&needle)
        })
    }

    #[must_use]
    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        orders.iter().filter(|o| self.matches(o)).cloned().collect()
    }
}

/// Parse a status filter where `all` means no filter.
///
/// # Errors
///
/// Returns the parse error for unknown statuses.
pub fn parse_status_filter(s: &str) -> Result<Option<OrderStatus>, String> {
    if s.trim().eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
