//! Checkout and order history commands.

use teeshop_core::{OrderId, ProductId, ShippingAddress};
use teeshop_storefront::Storefront;

use crate::error::CliError;
use crate::output;

pub async fn checkout(
    shop: &Storefront,
    street: String,
    city: String,
    postal_code: String,
) -> Result<(), CliError> {
    shop.cart().refresh().await?;
    let address = ShippingAddress {
        street,
        city,
        postal_code,
    };
    let order = shop.checkout().place_order(&address).await?;
    output::success(&format!(
        "Order {} placed. Total {}, cash on delivery to {}",
        order.id, order.total_amount, order.address
    ));
    Ok(())
}

pub async fn list(shop: &Storefront) -> Result<(), CliError> {
    output::orders(&shop.checkout().orders().await?);
    Ok(())
}

pub async fn show(shop: &Storefront, id: &OrderId) -> Result<(), CliError> {
    output::order(&shop.checkout().order(id).await?);
    Ok(())
}

pub async fn rate(
    shop: &Storefront,
    order_id: &OrderId,
    product_id: &ProductId,
    stars: u8,
) -> Result<(), CliError> {
    let order = shop.checkout().order(order_id).await?;
    shop.checkout().rate(&order, product_id, stars).await?;
    output::success("Thanks for rating!");
    Ok(())
}
