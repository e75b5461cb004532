//! Wishlist commands.

use teeshop_core::ProductId;
use teeshop_storefront::Storefront;

use crate::error::CliError;
use crate::output;

pub async fn show(shop: &Storefront) -> Result<(), CliError> {
    shop.wishlist().refresh().await?;
    let items = shop.wishlist().store().items();
    if items.is_empty() {
        output::success("Your wishlist is empty.");
    } else {
        output::products(&items);
    }
    Ok(())
}

pub async fn toggle(shop: &Storefront, product_id: &ProductId) -> Result<(), CliError> {
    shop.wishlist().refresh().await?;
    let product = shop.api().product(product_id).await?;
    let saved = shop.wishlist().toggle(&product).await?;
    let message = if saved {
        format!("Added {} to wishlist", product.name)
    } else {
        format!("Removed {} from wishlist", product.name)
    };
    output::success(&message);
    Ok(())
}

pub async fn remove(shop: &Storefront, product_id: &ProductId) -> Result<(), CliError> {
    shop.wishlist().refresh().await?;
    if !shop.wishlist().remove(product_id).await? {
        return Err(CliError::NotFound(format!("{product_id} is not in the wishlist")));
    }
    output::success("Removed from wishlist");
    Ok(())
}
