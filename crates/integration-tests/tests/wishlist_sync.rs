//! Wishlist mirror against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use teeshop_core::ProductId;
use teeshop_integration_tests::{FakeBackend, tee, typed};

#[tokio::test]
async fn test_deleted_products_are_filtered() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());
    backend.seed_deleted_wishlist_entry();

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    shop.wishlist().add(&typed(&minimal)).await.unwrap();
    shop.wishlist().refresh().await.unwrap();

    let items = shop.wishlist().store().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Minimal Tee");
}

#[tokio::test]
async fn test_toggle_round_trip() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    let product = typed(&minimal);

    assert!(shop.wishlist().toggle(&product).await.unwrap());
    assert!(shop.wishlist().store().is_in_wishlist(&product.id));
    assert!(!shop.wishlist().toggle(&product).await.unwrap());
    assert!(shop.wishlist().store().is_empty());

    assert_eq!(backend.hits("POST /wishlist"), 1);
    assert_eq!(backend.hits("DELETE /wishlist/{id}"), 1);
}

#[tokio::test]
async fn test_failed_remove_restores_position() {
    let backend = FakeBackend::start().await;
    for (id, name) in [
        ("665f000000000000000000a1", "Minimal Tee"),
        ("665f000000000000000000a2", "Vintage Tee"),
        ("665f000000000000000000a3", "Oversized Tee"),
    ] {
        backend.seed_product(tee(id, name, 1500, 5));
    }

    let dir = tempfile::tempdir().unwrap();
    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    for id in ["665f000000000000000000a1", "665f000000000000000000a2", "665f000000000000000000a3"] {
        let product = shop.api().product(&ProductId::new(id)).await.unwrap();
        shop.wishlist().add(&product).await.unwrap();
    }

    backend.fail_next(
        "DELETE /wishlist/{id}",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "Server error" }),
    );
    let err = shop
        .wishlist()
        .remove(&ProductId::new("665f000000000000000000a2"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Server error");
    let names: Vec<String> = shop
        .wishlist()
        .store()
        .items()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Minimal Tee", "Vintage Tee", "Oversized Tee"]);
}
