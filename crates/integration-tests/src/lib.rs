//! Integration test support for the Pachamama storefront client.
//!
//! [`StubBackend`] is an in-process axum server speaking the backend's REST
//! API. It keeps products and carts in memory, counts every call per
//! endpoint, and can be told to fail upcoming product writes.
//!
//! [`TestContext`] wires a [`Storefront`] to a fresh stub with in-memory
//! state, a manual clock and a recording checkout opener.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pachamama-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use pachamama_core::{Cart, CartItem, Price, Product, ProductId, ProductInput};
use pachamama_storefront::Storefront;
use pachamama_storefront::clock::ManualClock;
use pachamama_storefront::config::{ClientConfig, RetrySettings};
use pachamama_storefront::services::LinkOpener;
use pachamama_storefront::storage::MemoryStore;

/// Secret the stub accepts for admin access.
pub const ADMIN_SECRET: &str = "pachamama-secret";

/// Token the stub hands out and accepts.
pub const VALID_TOKEN: &str = "token-123";

// =============================================================================
// Stub state
// =============================================================================

/// Shared state behind the stub's handlers.
#[derive(Clone, Default)]
pub struct StubState {
    inner: Arc<StubInner>,
}

#[derive(Default)]
struct StubInner {
    products: Mutex<Vec<Product>>,
    next_id: Mutex<u32>,
    carts: Mutex<HashMap<String, Cart>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    write_failures: Mutex<VecDeque<StatusCode>>,
    categories_down: Mutex<bool>,
    token_revoked: Mutex<bool>,
    checkout_without_link: Mutex<bool>,
    checkouts: Mutex<Vec<Value>>,
}

impl StubState {
    /// Number of calls made to `endpoint`, e.g. `"verify-token"`.
    #[must_use]
    pub fn calls(&self, endpoint: &str) -> usize {
        self.inner.calls.lock().get(endpoint).copied().unwrap_or(0)
    }

    /// Total calls across every endpoint.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.inner.calls.lock().values().sum()
    }

    /// Seed a product directly.
    pub fn insert_product(&self, id: &str, name: &str, price: i64, category: &str) {
        let product = ProductInput::new(name, Price::from_units(price))
            .with_category(category)
            .into_product(ProductId::new(id));
        self.inner.products.lock().push(product);
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.products.lock().clone()
    }

    /// Fail the next `count` product writes with `status`.
    pub fn fail_writes(&self, status: StatusCode, count: usize) {
        let mut failures = self.inner.write_failures.lock();
        failures.extend(std::iter::repeat_n(status, count));
    }

    /// Make the categories endpoint return 500.
    pub fn take_categories_down(&self) {
        *self.inner.categories_down.lock() = true;
    }

    /// Reject the issued token from now on.
    pub fn revoke_token(&self) {
        *self.inner.token_revoked.lock() = true;
    }

    /// Accept checkouts without returning a `whatsappUrl`.
    pub fn omit_checkout_link(&self) {
        *self.inner.checkout_without_link.lock() = true;
    }

    /// Bodies received by the checkout endpoint.
    #[must_use]
    pub fn checkouts(&self) -> Vec<Value> {
        self.inner.checkouts.lock().clone()
    }

    fn hit(&self, endpoint: &'static str) {
        *self.inner.calls.lock().entry(endpoint).or_default() += 1;
    }

    fn token_is_valid(&self, token: &str) -> bool {
        token == VALID_TOKEN && !*self.inner.token_revoked.lock()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.token_is_valid(token))
    }

    /// Shared checks for product writes: auth first, then scripted failures.
    fn check_write(&self, headers: &HeaderMap) -> Result<(), Response> {
        if !self.authorized(headers) {
            return Err(error_response(StatusCode::UNAUTHORIZED, "Invalid token"));
        }
        if let Some(status) = self.inner.write_failures.lock().pop_front() {
            let message = if status.is_server_error() {
                "Internal error"
            } else {
                "Price must be positive"
            };
            return Err(error_response(status, message));
        }
        Ok(())
    }

    fn find_product(&self, id: &str) -> Option<Product> {
        self.inner
            .products
            .lock()
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminAccessBody {
    secret_key: String,
}

async fn admin_access(State(state): State<StubState>, Json(body): Json<AdminAccessBody>) -> Response {
    state.hit("admin-access");
    if body.secret_key == ADMIN_SECRET {
        Json(json!({ "success": true, "token": VALID_TOKEN })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid access key" })),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
struct VerifyTokenBody {
    token: String,
}

async fn verify_token(State(state): State<StubState>, Json(body): Json<VerifyTokenBody>) -> Json<Value> {
    state.hit("verify-token");
    Json(json!({ "success": state.token_is_valid(&body.token) }))
}

#[derive(Deserialize)]
struct ProductQuery {
    search: Option<String>,
    category: Option<String>,
}

async fn list_products(State(state): State<StubState>, Query(query): Query<ProductQuery>) -> Json<Vec<Product>> {
    state.hit("products.list");
    let products = state
        .products()
        .into_iter()
        .filter(|p| {
            query
                .search
                .as_ref()
                .is_none_or(|s| p.name.to_lowercase().contains(&s.to_lowercase()))
        })
        .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
        .collect();
    Json(products)
}

async fn list_categories(State(state): State<StubState>) -> Response {
    state.hit("categories");
    if *state.inner.categories_down.lock() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Categories unavailable");
    }
    let categories: Vec<String> = state.products().into_iter().map(|p| p.category).collect();
    Json(categories).into_response()
}

async fn get_product(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    state.hit("products.get");
    state.find_product(&id).map_or_else(
        || error_response(StatusCode::NOT_FOUND, "Product not found"),
        |product| Json(product).into_response(),
    )
}

async fn create_product(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Response {
    state.hit("products.create");
    if let Err(response) = state.check_write(&headers) {
        return response;
    }
    let id = {
        let mut next = state.inner.next_id.lock();
        *next += 1;
        format!("new-{next}")
    };
    let product = input.into_product(ProductId::new(id));
    state.inner.products.lock().push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Response {
    state.hit("products.update");
    if let Err(response) = state.check_write(&headers) {
        return response;
    }
    let mut products = state.inner.products.lock();
    let Some(existing) = products.iter_mut().find(|p| p.id.as_str() == id) else {
        return error_response(StatusCode::NOT_FOUND, "Product not found");
    };
    *existing = input.into_product(ProductId::new(id));
    Json(existing.clone()).into_response()
}

async fn delete_product(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit("products.delete");
    if let Err(response) = state.check_write(&headers) {
        return response;
    }
    let mut products = state.inner.products.lock();
    let before = products.len();
    products.retain(|p| p.id.as_str() != id);
    if products.len() == before {
        return error_response(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "message": "Product deleted" })).into_response()
}

async fn get_cart(State(state): State<StubState>, Path(session_id): Path<String>) -> Json<Value> {
    state.hit("cart.get");
    let cart = state.inner.carts.lock().get(&session_id).cloned().unwrap_or_default();
    Json(json!({ "data": cart }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    session_id: String,
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
}

async fn cart_add(State(state): State<StubState>, Json(body): Json<CartBody>) -> Response {
    state.hit("cart.add");
    let Some(product_id) = body.product_id else {
        return error_response(StatusCode::BAD_REQUEST, "productId is required");
    };
    let Some(product) = state.find_product(&product_id) else {
        return error_response(StatusCode::NOT_FOUND, "Product not found");
    };
    let quantity = body.quantity.unwrap_or(1);

    let mut carts = state.inner.carts.lock();
    let cart = carts.entry(body.session_id).or_default();
    match cart.items.iter_mut().find(|i| i.product_id.as_str() == product_id) {
        Some(item) => item.quantity += quantity,
        None => cart.items.push(CartItem {
            product_id: ProductId::new(product_id),
            quantity,
            product: Some(product),
        }),
    }
    Json(json!({ "data": cart })).into_response()
}

async fn cart_remove(State(state): State<StubState>, Json(body): Json<CartBody>) -> Json<Value> {
    state.hit("cart.remove");
    let mut carts = state.inner.carts.lock();
    let cart = carts.entry(body.session_id).or_default();
    if let Some(product_id) = body.product_id {
        cart.items.retain(|i| i.product_id.as_str() != product_id);
    }
    Json(json!({ "data": cart }))
}

async fn cart_clear(State(state): State<StubState>, Json(body): Json<CartBody>) -> Json<Value> {
    state.hit("cart.clear");
    let mut carts = state.inner.carts.lock();
    let cart = carts.entry(body.session_id).or_default();
    cart.items.clear();
    Json(json!({ "data": cart }))
}

async fn cart_checkout(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.hit("cart.checkout");
    let Some(session_id) = body.get("sessionId").and_then(Value::as_str).map(str::to_owned) else {
        return error_response(StatusCode::BAD_REQUEST, "sessionId is required");
    };
    let cart = state.inner.carts.lock().remove(&session_id).unwrap_or_default();
    if cart.items.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Cart is empty");
    }
    state.inner.checkouts.lock().push(body);
    if *state.inner.checkout_without_link.lock() {
        return Json(json!({ "data": {} })).into_response();
    }
    let url = format!("https://wa.me/5550000?text=Order%20total%20{}", cart.total());
    Json(json!({ "data": { "whatsappUrl": url } })).into_response()
}

// =============================================================================
// Server
// =============================================================================

/// An in-process backend bound to a random local port.
pub struct StubBackend {
    pub url: Url,
    pub state: StubState,
    server: tokio::task::JoinHandle<()>,
}

impl StubBackend {
    /// Start a stub with no products.
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/auth/admin-access", post(admin_access))
            .route("/api/auth/verify-token", post(verify_token))
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/products/categories", get(list_categories))
            .route(
                "/api/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/api/cart/add", post(cart_add))
            .route("/api/cart/remove", post(cart_remove))
            .route("/api/cart/clear", post(cart_clear))
            .route("/api/cart/checkout", post(cart_checkout))
            .route("/api/cart/{session_id}", get(get_cart))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).unwrap(),
            state,
            server,
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Client side
// =============================================================================

/// Checkout opener that remembers every link.
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.opened.lock().push(url.to_owned());
    }
}

/// A storefront wired to a fresh stub backend.
pub struct TestContext {
    pub backend: StubBackend,
    pub storefront: Storefront,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub opener: Arc<RecordingOpener>,
}

impl TestContext {
    /// Two retries, 10 ms apart, and a 25 minute token window.
    pub async fn new() -> Self {
        Self::with_retries(2).await
    }

    pub async fn with_retries(max_retries: u32) -> Self {
        let backend = StubBackend::start().await;
        let config = ClientConfig::new(backend.url.clone())
            .with_retry(RetrySettings {
                max_retries,
                delay: Duration::from_millis(10),
            })
            .with_token_refresh_window(Duration::from_secs(25 * 60));

        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let opener = Arc::new(RecordingOpener::default());
        let storefront = Storefront::with_parts(
            config,
            store.clone(),
            clock.clone(),
            opener.clone(),
        )
        .unwrap();

        Self {
            backend,
            storefront,
            store,
            clock,
            opener,
        }
    }

    #[must_use]
    pub fn stub(&self) -> &StubState {
        &self.backend.state
    }

    /// Log in with the stub's admin secret.
    pub async fn login(&self) {
        let secret = secrecy::SecretString::from(ADMIN_SECRET.to_owned());
        assert!(self.storefront.auth().verify_admin_access(&secret).await);
    }
}
