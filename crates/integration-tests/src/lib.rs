//! Integration test support for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Test Support
//!
//! - [`MockCatalog`] - an in-process catalog API (`/products/{id}`, `/stock/{id}`)
//!   served by `axum` on an ephemeral port, with knobs for outages, latency
//!   and authentication

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_core::{Product, ProductId, StockLevel};
use rust_decimal::Decimal;

// =============================================================================
// MockCatalog
// =============================================================================

/// A running mock catalog API.
///
/// The server task is aborted when the handle is dropped.
pub struct MockCatalog {
    base_url: String,
    state: Arc<CatalogState>,
    server: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
struct CatalogState {
    products: Mutex<HashMap<ProductId, Product>>,
    stock: Mutex<HashMap<ProductId, u32>>,
    product_hits: AtomicUsize,
    stock_hits: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    token: Mutex<Option<String>>,
}

impl MockCatalog {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(CatalogState::default());

        let app = Router::new()
            .route("/products/{id}", get(get_product))
            .route("/stock/{id}", get(get_stock))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock catalog");
        let addr = listener.local_addr().expect("Mock catalog has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock catalog server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    /// Base URL to configure the inventory client with.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add or replace a product and its stock.
    pub fn insert(&self, product: Product, stock: u32) {
        lock(&self.state.stock).insert(product.id, stock);
        lock(&self.state.products).insert(product.id, product);
    }

    /// Change the stock of a product.
    pub fn set_stock(&self, product_id: ProductId, amount: u32) {
        lock(&self.state.stock).insert(product_id, amount);
    }

    /// Answer every request with `500 Internal Server Error`.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Wait this long before answering each request.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.state.delay) = delay;
    }

    /// Require `Authorization: Bearer <token>` on every request.
    pub fn require_token(&self, token: &str) {
        *lock(&self.state.token) = Some(token.to_string());
    }

    /// Number of `/products/{id}` requests served.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    /// Number of `/stock/{id}` requests served.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A catalog sneaker with a price in cents.
#[must_use]
pub fn sneaker(id: i32, title: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Decimal::new(cents, 2),
        image: format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared request gate: latency, outage and authentication.
async fn gate(state: &CatalogState, headers: &HeaderMap) -> Option<Response> {
    let delay = *lock(&state.delay);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if state.failing.load(Ordering::SeqCst) {
        return Some((StatusCode::INTERNAL_SERVER_ERROR, "catalog exploded").into_response());
    }

    let expected = lock(&state.token).clone();
    if let Some(token) = expected {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {token}"));
        if !authorized {
            return Some(StatusCode::UNAUTHORIZED.into_response());
        }
    }

    None
}

async fn get_product(
    State(state): State<Arc<CatalogState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i32>,
) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = gate(&state, &headers).await {
        return rejection;
    }

    let product = lock(&state.products).get(&ProductId::new(id)).cloned();
    product.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |product| Json(product).into_response(),
    )
}

async fn get_stock(
    State(state): State<Arc<CatalogState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i32>,
) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = gate(&state, &headers).await {
        return rejection;
    }

    let id = ProductId::new(id);
    let amount = lock(&state.stock).get(&id).copied();
    amount.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(StockLevel { id, amount }).into_response(),
    )
}
