//! Integration tests for the Teeshop storefront.
//!
//! Each test starts an in-process fake of the shop backend on an ephemeral
//! port and drives a real [`Storefront`] against it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p teeshop-integration-tests
//! ```
//!
//! The fake keeps one account (see [`EMAIL`] and [`PASSWORD`]), a catalog
//! seeded by the test, and a cart, wishlist and order list for that
//! account. Any endpoint can be made to fail once with
//! [`FakeBackend::fail_next`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use teeshop_core::{Email, Product};
use teeshop_storefront::{Storefront, StorefrontConfig};

pub const EMAIL: &str = "ayesha@example.pk";
pub const PASSWORD: &str = "correct horse";
pub const TOKEN: &str = "tok-ayesha-1";
pub const USER_ID: &str = "665f00000000000000000001";

/// A typed product from a catalog document.
///
/// # Panics
///
/// Panics if the document is not a valid product.
#[must_use]
#[allow(clippy::expect_used)]
pub fn typed(product: &Value) -> Product {
    serde_json::from_value(product.clone()).expect("product document")
}

/// A product document with the same stock in every size.
#[must_use]
pub fn tee(id: &str, name: &str, price: i64, stock: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "price": price,
        "category": "Graphic",
        "imageUrl": format!("https://cdn.example.pk/{id}.jpg"),
        "sizes": [
            {"size": "Small", "stock": stock},
            {"size": "Large", "stock": stock},
            {"size": "Extra Large", "stock": stock},
        ],
    })
}

#[derive(Debug, Clone)]
struct Line {
    product_id: String,
    size: String,
    quantity: u64,
}

#[derive(Debug, Default)]
struct Backend {
    products: Vec<Value>,
    token: Option<String>,
    user: Option<Value>,
    /// `None` until the first add; the real backend 404s on a missing cart.
    cart: Option<Vec<Line>>,
    /// `None` entries are products deleted after being saved.
    wishlist: Vec<Option<String>>,
    orders: Vec<Value>,
    failures: HashMap<String, (StatusCode, Value)>,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<Backend>>;

fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn message(status: StatusCode, text: &str) -> Response {
    reply(status, json!({ "message": text }))
}

impl Backend {
    /// Log the request, apply any queued failure, then check the bearer.
    fn admit(&mut self, route: &str, headers: &HeaderMap, needs_auth: bool) -> Result<(), Response> {
        self.requests.push(route.to_string());
        if let Some((status, body)) = self.failures.remove(route) {
            return Err(reply(status, body));
        }
        if needs_auth {
            let bearer = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            if bearer.is_none() || bearer != self.token.as_deref() {
                return Err(message(StatusCode::UNAUTHORIZED, "Not authorized, token failed"));
            }
        }
        Ok(())
    }

    fn product(&self, id: &str) -> Option<&Value> {
        self.products.iter().find(|p| p["_id"] == id)
    }

    fn stock(&self, id: &str, size: &str) -> u64 {
        self.product(id)
            .and_then(|p| p["sizes"].as_array())
            .and_then(|sizes| sizes.iter().find(|s| s["size"] == size))
            .and_then(|s| s["stock"].as_u64())
            .unwrap_or(0)
    }

    fn cart_json(&self) -> Value {
        let lines = self.cart.as_deref().unwrap_or_default();
        let mut total = 0;
        let items: Vec<Value> = lines
            .iter()
            .filter_map(|line| {
                let product = self.product(&line.product_id)?;
                total += product["price"].as_u64().unwrap_or(0) * line.quantity;
                Some(json!({
                    "productId": product,
                    "size": line.size,
                    "quantity": line.quantity,
                }))
            })
            .collect();
        json!({ "userId": USER_ID, "items": items, "totalAmount": total })
    }

    fn start_session(&mut self, name: &str) -> Value {
        let user = json!({
            "_id": USER_ID,
            "name": name,
            "email": EMAIL,
            "isAdmin": false,
        });
        self.user = Some(user.clone());
        self.token = Some(TOKEN.to_string());
        user
    }
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    name: Option<String>,
    email: String,
    password: String,
}

async fn login(State(app): State<Shared>, headers: HeaderMap, Json(body): Json<Credentials>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("POST /users/login", &headers, false) {
        return r;
    }
    if body.email != EMAIL || body.password != PASSWORD {
        return message(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let mut user = backend.start_session("Ayesha Khan");
    user["token"] = json!(TOKEN);
    Json(user).into_response()
}

async fn signup(State(app): State<Shared>, headers: HeaderMap, Json(body): Json<Credentials>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("POST /users/signup", &headers, false) {
        return r;
    }
    if body.email != EMAIL {
        return message(StatusCode::BAD_REQUEST, "Only the test account can sign up");
    }
    if body.password.len() < 6 {
        return message(StatusCode::BAD_REQUEST, "Password must be at least 6 characters");
    }
    let user = backend.start_session(body.name.as_deref().unwrap_or("Ayesha Khan"));
    (StatusCode::CREATED, Json(json!({ "user": user, "token": TOKEN }))).into_response()
}

async fn profile(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /users/profile", &headers, true) {
        return r;
    }
    Json(backend.user.clone().unwrap_or(Value::Null)).into_response()
}

async fn update_profile(State(app): State<Shared>, headers: HeaderMap, Json(patch): Json<Value>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("PUT /users/profile", &headers, true) {
        return r;
    }
    let Some(user) = backend.user.as_mut() else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    if let (Some(user), Some(patch)) = (user.as_object_mut(), patch.as_object()) {
        for (field, value) in patch {
            user.insert(field.clone(), value.clone());
        }
    }
    Json(user.clone()).into_response()
}

async fn products(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /products", &headers, false) {
        return r;
    }
    Json(backend.products.clone()).into_response()
}

async fn product(State(app): State<Shared>, headers: HeaderMap, UrlPath(id): UrlPath<String>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /products/{id}", &headers, false) {
        return r;
    }
    backend.product(&id).map_or_else(
        || message(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p.clone()).into_response(),
    )
}

async fn cart(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /cart", &headers, true) {
        return r;
    }
    if backend.cart.is_none() {
        return message(StatusCode::NOT_FOUND, "Cart not found");
    }
    Json(backend.cart_json()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddLine {
    product_id: String,
    size: String,
    quantity: u64,
}

async fn add_to_cart(State(app): State<Shared>, headers: HeaderMap, Json(body): Json<AddLine>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("POST /cart", &headers, true) {
        return r;
    }
    if backend.product(&body.product_id).is_none() {
        return message(StatusCode::NOT_FOUND, "Product not found");
    }
    let stock = backend.stock(&body.product_id, &body.size);
    let lines = backend.cart.get_or_insert_with(Vec::new);
    if let Some(line) = lines
        .iter_mut()
        .find(|l| l.product_id == body.product_id && l.size == body.size)
    {
        if line.quantity + body.quantity > stock {
            return message(StatusCode::BAD_REQUEST, "Insufficient stock");
        }
        line.quantity += body.quantity;
    } else {
        if body.quantity > stock {
            return message(StatusCode::BAD_REQUEST, "Insufficient stock");
        }
        lines.push(Line {
            product_id: body.product_id,
            size: body.size,
            quantity: body.quantity,
        });
    }
    Json(backend.cart_json()).into_response()
}

#[derive(Deserialize)]
struct SetLine {
    size: String,
    quantity: u64,
}

async fn update_cart_item(
    State(app): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<SetLine>,
) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("PUT /cart/{id}", &headers, true) {
        return r;
    }
    if body.quantity > backend.stock(&id, &body.size) {
        return message(StatusCode::BAD_REQUEST, "Insufficient stock");
    }
    let line = backend
        .cart
        .as_mut()
        .and_then(|lines| lines.iter_mut().find(|l| l.product_id == id && l.size == body.size));
    match line {
        Some(line) => line.quantity = body.quantity,
        None => return message(StatusCode::NOT_FOUND, "Item not in cart"),
    }
    Json(backend.cart_json()).into_response()
}

#[derive(Deserialize)]
struct SizeParam {
    size: String,
}

async fn remove_from_cart(
    State(app): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Query(query): Query<SizeParam>,
) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("DELETE /cart/{id}", &headers, true) {
        return r;
    }
    if let Some(lines) = backend.cart.as_mut() {
        lines.retain(|l| !(l.product_id == id && l.size == query.size));
    }
    Json(backend.cart_json()).into_response()
}

async fn clear_cart(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("DELETE /cart/clear", &headers, true) {
        return r;
    }
    if let Some(lines) = backend.cart.as_mut() {
        lines.clear();
    }
    Json(json!({ "message": "Cart cleared" })).into_response()
}

async fn wishlist(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /wishlist", &headers, true) {
        return r;
    }
    let entries: Vec<Value> = backend
        .wishlist
        .iter()
        .map(|id| {
            let product = id.as_deref().and_then(|id| backend.product(id)).cloned();
            json!({ "productId": product, "addedAt": "2024-06-01T12:00:00.000Z" })
        })
        .collect();
    Json(json!({ "userId": USER_ID, "products": entries })).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveProduct {
    product_id: String,
}

async fn add_to_wishlist(State(app): State<Shared>, headers: HeaderMap, Json(body): Json<SaveProduct>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("POST /wishlist", &headers, true) {
        return r;
    }
    if backend.wishlist.iter().flatten().any(|id| *id == body.product_id) {
        return message(StatusCode::BAD_REQUEST, "Product already in wishlist");
    }
    backend.wishlist.push(Some(body.product_id));
    message(StatusCode::CREATED, "Added to wishlist")
}

async fn remove_from_wishlist(
    State(app): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("DELETE /wishlist/{id}", &headers, true) {
        return r;
    }
    backend.wishlist.retain(|entry| entry.as_deref() != Some(id.as_str()));
    message(StatusCode::OK, "Removed from wishlist")
}

async fn create_order(State(app): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("POST /orders", &headers, true) {
        return r;
    }
    let requested = body["products"].as_array().cloned().unwrap_or_default();
    let mut lines = Vec::new();
    let mut total = 0;
    for line in &requested {
        let id = line["productId"].as_str().unwrap_or_default();
        let size = line["size"].as_str().unwrap_or_default();
        let quantity = line["quantity"].as_u64().unwrap_or(0);
        let Some(product) = backend.product(id) else {
            return message(StatusCode::NOT_FOUND, "Product not found");
        };
        if quantity > backend.stock(id, size) {
            return message(StatusCode::BAD_REQUEST, "Insufficient stock");
        }
        let price = product["price"].as_u64().unwrap_or(0);
        total += price * quantity;
        lines.push(json!({
            "productId": id,
            "productName": product["name"],
            "quantity": quantity,
            "price": price,
            "size": size,
        }));
    }
    let order = json!({
        "_id": format!("665f0000000000000000{:04}", backend.orders.len() + 1),
        "userId": USER_ID,
        "products": lines,
        "totalAmount": total,
        "status": "Pending",
        "address": body["address"],
        "paymentMethod": "Cash on Delivery",
        "createdAt": "2024-06-01T12:00:00.000Z",
    });
    backend.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn orders(State(app): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&app);
    if let Err(r) = backend.admit("GET /orders", &headers, true) {
        return r;
    }
    Json(backend.orders.clone()).into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/users/login", post(login))
        .route("/users/signup", post(signup))
        .route("/users/profile", get(profile).put(update_profile))
        .route("/products", get(products))
        .route("/products/{id}", get(product))
        .route("/cart", get(cart).post(add_to_cart))
        .route("/cart/clear", delete(clear_cart))
        .route("/cart/{id}", delete(remove_from_cart).put(update_cart_item))
        .route("/wishlist", get(wishlist).post(add_to_wishlist))
        .route("/wishlist/{id}", delete(remove_from_wishlist))
        .route("/orders", get(orders).post(create_order))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An in-process fake of the shop backend.
///
/// The server task stops when the handle is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Shared::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });
        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Add a product document, e.g. from [`tee`].
    pub fn seed_product(&self, product: Value) {
        lock(&self.state).products.push(product);
    }

    /// Save a product to the wishlist, then delete it from the catalog.
    pub fn seed_deleted_wishlist_entry(&self) {
        lock(&self.state).wishlist.push(None);
    }

    /// Put a line in the server cart directly, as another device would.
    pub fn seed_cart_line(&self, product_id: &str, size: &str, quantity: u64) {
        lock(&self.state)
            .cart
            .get_or_insert_with(Vec::new)
            .push(Line {
                product_id: product_id.to_string(),
                size: size.to_string(),
                quantity,
            });
    }

    /// Invalidate the issued token so every authenticated call gets 401.
    pub fn expire_token(&self) {
        lock(&self.state).token = None;
    }

    /// Make the next request to `route` (e.g. `"POST /cart"`) fail.
    pub fn fail_next(&self, route: &str, status: StatusCode, body: Value) {
        lock(&self.state)
            .failures
            .insert(route.to_string(), (status, body));
    }

    /// Routes hit so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// How many times `route` was hit.
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        lock(&self.state).requests.iter().filter(|r| *r == route).count()
    }

    /// The server cart as `(product id, size, quantity)`.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(String, String, u64)> {
        lock(&self.state)
            .cart
            .iter()
            .flatten()
            .map(|l| (l.product_id.clone(), l.size.clone(), l.quantity))
            .collect()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }

    /// A storefront for this backend whose session lives in `session_file`.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be built.
    #[allow(clippy::expect_used)]
    pub async fn storefront(&self, session_file: &Path) -> Storefront {
        let config =
            StorefrontConfig::for_api(&self.url(), session_file).expect("fake backend url");
        Storefront::open(&config).await.expect("storefront")
    }

    /// Like [`FakeBackend::storefront`], logged in as the test account.
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    #[allow(clippy::expect_used)]
    pub async fn signed_in(&self, session_file: &Path) -> Storefront {
        let shop = self.storefront(session_file).await;
        let email = Email::parse(EMAIL).expect("test email");
        shop.session()
            .login(&email, &SecretString::from(PASSWORD))
            .await
            .expect("login");
        shop
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
