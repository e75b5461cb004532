//! Session lifecycle: login, persistence across runs, logout and expiry.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use teeshop_core::{Email, Size, UserPatch};
use teeshop_integration_tests::{EMAIL, FakeBackend, PASSWORD, USER_ID, tee, typed};
use teeshop_storefront::store::SessionEvent;

fn email() -> Email {
    Email::parse(EMAIL).unwrap()
}

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = backend.signed_in(&file).await;
    assert!(first.auth().is_authenticated());
    drop(first);

    let second = backend.storefront(&file).await;
    let user = second.auth().user().unwrap();
    assert_eq!(user.id.as_str(), USER_ID);
    assert_eq!(user.name, "Ayesha Khan");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    let persisted = &raw["auth-storage"];
    assert_eq!(persisted["version"], 1);
    assert_eq!(persisted["state"]["isAuthenticated"], true);
    assert_eq!(persisted["state"]["token"], teeshop_integration_tests::TOKEN);

    // The restored token is accepted by the backend.
    second.cart().refresh().await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_keeps_anonymous() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let shop = backend.storefront(&dir.path().join("session.json")).await;
    let mut events = shop.auth().subscribe();

    let err = shop
        .session()
        .login(&email(), &SecretString::from("hunter2"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid email or password");
    assert!(!shop.auth().is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_signup_starts_session() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let shop = backend.storefront(&dir.path().join("session.json")).await;

    let user = shop
        .session()
        .signup("Bilal Ahmed", &email(), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert_eq!(user.name, "Bilal Ahmed");
    assert!(shop.auth().is_authenticated());
}

#[tokio::test]
async fn test_expired_token_tears_down_session() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let shop = backend.signed_in(&file).await;
    shop.cart().add(&typed(&minimal), Size::Small, 1).await.unwrap();
    let mut events = shop.auth().subscribe();

    backend.expire_token();
    let err = shop
        .cart()
        .add(&typed(&minimal), Size::Large, 1)
        .await
        .unwrap_err();

    assert!(err.needs_login());
    assert!(!shop.auth().is_authenticated());
    assert!(shop.cart().store().is_empty());
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Expired));

    let restarted = backend.storefront(&file).await;
    assert!(!restarted.auth().is_authenticated());
}

#[tokio::test]
async fn test_expiry_on_order_history_clears_mirrors() {
    let backend = FakeBackend::start().await;
    let minimal = tee("665f000000000000000000a1", "Minimal Tee", 1500, 5);
    backend.seed_product(minimal.clone());
    let dir = tempfile::tempdir().unwrap();

    let shop = backend.signed_in(&dir.path().join("session.json")).await;
    shop.cart().add(&typed(&minimal), Size::Small, 1).await.unwrap();
    shop.wishlist().add(&typed(&minimal)).await.unwrap();

    backend.expire_token();
    let err = shop.checkout().orders().await.unwrap_err();

    assert!(err.needs_login());
    assert!(!shop.auth().is_authenticated());
    assert!(shop.cart().store().is_empty());
    assert!(shop.wishlist().store().is_empty());
}

#[tokio::test]
async fn test_logout_purges_persisted_session() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let shop = backend.signed_in(&file).await;
    shop.session().logout().await.unwrap();
    assert!(!shop.auth().is_authenticated());

    let restarted = backend.storefront(&file).await;
    assert!(!restarted.auth().is_authenticated());
    assert!(restarted.cart().refresh().await.unwrap_err().needs_login());
    assert_eq!(backend.hits("GET /cart"), 0);
}

#[tokio::test]
async fn test_profile_edit_is_persisted() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let shop = backend.signed_in(&file).await;
    let patch = UserPatch {
        address: Some("12 Mall Road, Lahore".to_string()),
        ..UserPatch::default()
    };
    let user = shop.session().update_profile(patch).await.unwrap();
    assert_eq!(user.address.as_deref(), Some("12 Mall Road, Lahore"));

    let restarted = backend.storefront(&file).await;
    assert_eq!(
        restarted.auth().user().unwrap().address.as_deref(),
        Some("12 Mall Road, Lahore")
    );
}
