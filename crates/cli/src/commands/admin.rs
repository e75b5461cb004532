//! Admin console commands.

use teeshop_core::{OrderId, OrderStatus, ProductId, Size, UserId};
use teeshop_storefront::Storefront;
use teeshop_storefront::api::AdminOrderQuery;
use teeshop_storefront::catalog::{OrderFilter, parse_status_filter};

use crate::error::CliError;
use crate::output;

/// Admin calls go straight to the backend, which enforces the role; the
/// local check only saves a round trip.
async fn require_admin(shop: &Storefront) -> Result<(), CliError> {
    let state = shop.auth().wait_ready().await;
    if state.session().is_some_and(|s| s.user.is_admin) {
        Ok(())
    } else {
        Err(CliError::InvalidArgument(
            "Admin access required".to_string(),
        ))
    }
}

pub async fn analytics(shop: &Storefront) -> Result<(), CliError> {
    require_admin(shop).await?;
    output::analytics(&shop.api().analytics().await?);
    Ok(())
}

pub async fn orders(shop: &Storefront, status: &str, search: Option<String>) -> Result<(), CliError> {
    require_admin(shop).await?;
    let status = parse_status_filter(status).map_err(CliError::InvalidArgument)?;
    let orders = shop.api().admin_orders(AdminOrderQuery { status }).await?;
    let filter = OrderFilter { status, search };
    output::orders(&filter.apply(&orders));
    Ok(())
}

pub async fn set_status(shop: &Storefront, id: &OrderId, status: OrderStatus) -> Result<(), CliError> {
    require_admin(shop).await?;
    shop.api().update_order_status(id, status).await?;
    output::success(&format!("Order {id} is now {status}"));
    Ok(())
}

pub async fn stock(shop: &Storefront, id: &ProductId, size: Size, stock: u32) -> Result<(), CliError> {
    require_admin(shop).await?;
    shop.api().update_stock(id, size, stock).await?;
    output::success(&format!("{id} ({size}) stock set to {stock}"));
    Ok(())
}

pub async fn delete_product(shop: &Storefront, id: &ProductId) -> Result<(), CliError> {
    require_admin(shop).await?;
    shop.api().delete_product(id).await?;
    output::success(&format!("Product {id} deleted"));
    Ok(())
}

pub async fn users(shop: &Storefront) -> Result<(), CliError> {
    require_admin(shop).await?;
    for user in shop.api().admin_users().await? {
        output::user(&user);
    }
    Ok(())
}

pub async fn role(shop: &Storefront, id: &UserId, is_admin: bool) -> Result<(), CliError> {
    require_admin(shop).await?;
    shop.api().update_user_role(id, is_admin).await?;
    let role = if is_admin { "admin" } else { "customer" };
    output::success(&format!("User {id} is now {role}"));
    Ok(())
}

pub async fn delete_user(shop: &Storefront, id: &UserId) -> Result<(), CliError> {
    require_admin(shop).await?;
    shop.api().delete_user(id).await?;
    output::success(&format!("User {id} deleted"));
    Ok(())
}
