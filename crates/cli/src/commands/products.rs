//! Catalog commands.

use rust_decimal::Decimal;

use teeshop_core::{ProductId, Size};
use teeshop_storefront::Storefront;
use teeshop_storefront::api::ProductQuery;
use teeshop_storefront::catalog::{ProductFilter, ProductSort, related_products};

use crate::error::CliError;
use crate::output;

pub fn filter(
    category: Option<String>,
    size: Option<Size>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    search: Option<String>,
    sort: ProductSort,
) -> ProductFilter {
    let defaults = ProductFilter::default();
    ProductFilter {
        category,
        size,
        min_price: min_price.unwrap_or(defaults.min_price),
        max_price: max_price.unwrap_or(defaults.max_price),
        search,
        sort,
    }
}

pub async fn list(shop: &Storefront, filter: &ProductFilter) -> Result<(), CliError> {
    if filter.min_price > filter.max_price {
        return Err(CliError::InvalidArgument(
            "--min-price is above --max-price".to_string(),
        ));
    }
    let all = shop.api().products(&ProductQuery::default()).await?;
    output::products(&filter.apply(&all));
    Ok(())
}

pub async fn show(shop: &Storefront, id: &ProductId) -> Result<(), CliError> {
    let product = shop.api().product(id).await?;
    output::product_detail(&product);

    let same_category = shop.api().products_by_category(&product.category).await?;
    let related = related_products(&product, &same_category);
    if !related.is_empty() {
        output::success("\nYou may also like:");
        output::products(&related);
    }
    Ok(())
}

pub async fn search(shop: &Storefront, query: &str) -> Result<(), CliError> {
    output::products(&shop.api().search_products(query).await?);
    Ok(())
}

pub async fn top_selling(shop: &Storefront, limit: Option<u32>) -> Result<(), CliError> {
    output::products(&shop.api().top_selling(limit).await?);
    Ok(())
}

pub async fn new_arrivals(shop: &Storefront, limit: Option<u32>) -> Result<(), CliError> {
    output::products(&shop.api().new_arrivals(limit).await?);
    Ok(())
}
