//! Checkout against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use teeshop_core::{OrderStatus, Price, ShippingAddress, Size};
use teeshop_integration_tests::{FakeBackend, tee, typed};
use teeshop_storefront::SyncError;

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "12 Mall Road".to_string(),
        city: "Lahore".to_string(),
        postal_code: "54000".to_string(),
    }
}

#[tokio::test]
async fn test_order_clears_both_carts() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    shop.cart().add(&typed(&minimal), Size::Small, 2).await.unwrap();

    let order = shop.checkout().place_order(&address()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Price::from_rupees(3000));
    assert_eq!(order.address, "12 Mall Road, Lahore, 54000");
    assert!(shop.cart().store().is_empty());
    assert!(backend.cart_lines().is_empty());
    assert_eq!(shop.checkout().orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_never_reaches_backend() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;

    let err = shop.checkout().place_order(&address()).await.unwrap_err();

    assert!(matches!(err, SyncError::EmptyCart));
    assert_eq!(backend.hits("POST /orders"), 0);
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    shop.cart().add(&typed(&minimal), Size::Large, 1).await.unwrap();

    backend.fail_next(
        "POST /orders",
        StatusCode::BAD_REQUEST,
        json!({ "error": "Insufficient stock for Minimal Tee" }),
    );
    let err = shop.checkout().place_order(&address()).await.unwrap_err();

    assert_eq!(err.user_message(), "Insufficient stock for Minimal Tee");
    assert_eq!(shop.cart().store().item_count(), 1);
    assert_eq!(backend.cart_lines().len(), 1);
    assert_eq!(backend.order_count(), 0);
}

#[tokio::test]
async fn test_failed_server_clear_still_returns_order() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    shop.cart().add(&typed(&minimal), Size::Large, 1).await.unwrap();

    backend.fail_next(
        "DELETE /cart/clear",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "Server error" }),
    );
    let order = shop.checkout().place_order(&address()).await.unwrap();

    assert_eq!(order.products.len(), 1);
    assert!(shop.cart().store().is_empty());
    assert_eq!(backend.cart_lines().len(), 1);
}
