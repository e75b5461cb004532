//! Cart commands. Each run starts from the server cart.

use teeshop_core::{ProductId, Size};
use teeshop_storefront::Storefront;

use crate::error::CliError;
use crate::output;

pub async fn show(shop: &Storefront) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    let store = shop.cart().store();
    output::cart(&store.items(), store.total_amount());
    Ok(())
}

pub async fn add(
    shop: &Storefront,
    product_id: &ProductId,
    size: Size,
    quantity: u32,
) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    let product = shop.api().product(product_id).await?;
    shop.cart().add(&product, size, quantity).await?;
    output::success(&format!("Added {quantity} x {} ({size}) to cart", product.name));
    Ok(())
}

pub async fn set(
    shop: &Storefront,
    product_id: &ProductId,
    size: Size,
    quantity: u32,
) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    if !shop.cart().update_quantity(product_id, size, quantity).await? {
        return Err(CliError::NotFound(format!("{product_id} ({size}) is not in the cart")));
    }
    output::success("Cart updated");
    Ok(())
}

pub async fn remove(shop: &Storefront, product_id: &ProductId, size: Size) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    if !shop.cart().remove(product_id, size).await? {
        return Err(CliError::NotFound(format!("{product_id} ({size}) is not in the cart")));
    }
    output::success("Item removed from cart");
    Ok(())
}

pub async fn clear(shop: &Storefront) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    shop.cart().clear().await?;
    output::success("Cart cleared");
    Ok(())
}
