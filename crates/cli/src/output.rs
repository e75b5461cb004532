//! Terminal rendering.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use teeshop_core::{Analytics, CartItem, Order, Product, User};

pub fn failure(message: &str) {
    eprintln!("error: {message}");
}

pub fn success(message: &str) {
    println!("{message}");
}

pub fn product_row(product: &Product) {
    let sizes: Vec<String> = product
        .sizes
        .iter()
        .map(|s| format!("{}:{}", s.size, s.stock))
        .collect();
    let stock = if product.is_sold_out() {
        "SOLD OUT".to_string()
    } else {
        sizes.join(" ")
    };
    println!(
        "{:<26} {:<32} {:>12}  {:<12} {}",
        product.id,
        product.name,
        product.price.to_string(),
        product.category,
        stock
    );
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        product_row(product);
    }
    println!("{} product(s)", products.len());
}

pub fn product_detail(product: &Product) {
    println!("{} ({})", product.name, product.id);
    println!("  Category: {}", product.category);
    println!("  Price:    {}", product.price);
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if let (Some(avg), Some(count)) = (product.average_rating, product.total_ratings) {
        println!("  Rating:   {avg:.1} ({count} ratings)");
    }
    for size in &product.sizes {
        let label = if size.is_purchasable() {
            format!("{} in stock", size.stock)
        } else {
            "out of stock".to_string()
        };
        println!("  {:<12} {label}", size.size.to_string());
    }
}

pub fn cart(items: &[CartItem], total: teeshop_core::Price) {
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        println!(
            "{:<26} {:<28} {:<12} x{:<3} {:>14}",
            item.product.id,
            item.product.name,
            item.size.to_string(),
            item.quantity,
            item.line_total().to_string()
        );
    }
    println!("Total: {total}");
}

pub fn order(order: &Order) {
    println!(
        "{}  {}  {:<10}  {}",
        order.id,
        order.created_at.format("%Y-%m-%d"),
        order.status.to_string(),
        order.total_amount
    );
    for line in &order.products {
        println!(
            "    {} ({}) x{}  {}",
            line.product_name,
            line.size,
            line.quantity,
            line.price.times(line.quantity)
        );
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for o in orders {
        order(o);
    }
}

pub fn user(user: &User) {
    let role = if user.is_admin { " [admin]" } else { "" };
    println!("{} <{}>{role}", user.name, user.email);
    println!("  id: {}", user.id);
    if let Some(address) = &user.address {
        println!("  address: {address}");
    }
}

pub fn analytics(analytics: &Analytics) {
    println!("Revenue:  {}", analytics.total_revenue);
    println!("Orders:   {}", analytics.total_orders);
    println!("Products: {}", analytics.total_products);
    println!("Users:    {}", analytics.total_users);
    if let Some(top) = analytics.top_category() {
        println!("Top category: {} ({})", top.category, top.revenue);
    }
    if !analytics.low_stock_products.is_empty() {
        println!("Low stock:");
        for product in &analytics.low_stock_products {
            println!("  {} ({}): {} left", product.name, product.id, product.total_stock);
        }
    }
}
