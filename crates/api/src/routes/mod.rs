//! HTTP route handlers.
//!
//! # Route Structure
//!
//! Trailing slashes are optional on every path (see [`crate::app`]).
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (database)
//!
//! # Accounts (rate limited)
//! POST   /register/               - Create an account
//! POST   /token/                  - Obtain access + refresh tokens
//! POST   /token/refresh/          - Exchange a refresh token
//!
//! # Profile (authenticated)
//! GET    /user/                   - Current user
//! PUT    /user/                   - Partial profile update
//!
//! # Products
//! GET    /products/               - List all products
//! GET    /products/{pk}/          - Product detail
//! POST   /products/create/        - Create (Retailer)
//! PUT    /products/{pk}/update/   - Update own product (Retailer)
//! DELETE /products/{pk}/delete/   - Delete own product (Retailer)
//!
//! # Orders
//! GET    /orders/                 - Own orders (Customer) or all (Retailer)
//! POST   /orders/create/          - Place an order (Customer)
//!
//! # Cart (Customer)
//! GET    /cart/                   - Cart, created on first access
//! POST   /cart/                   - Add an item
//! DELETE /cart/{pk}/remove/       - Remove an item
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod user;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Whether the credential routes are rate limited.
///
/// Limiting keys on the client IP, which is only known when the server is
/// started with connect info or behind a proxy that forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    Disabled,
}

/// Create the account and token routes router.
pub fn credential_routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::obtain_token))
        .route("/token/refresh", post(auth::refresh_token));

    match rate_limiting {
        RateLimiting::Enabled => router.layer(auth_rate_limiter()),
        RateLimiting::Disabled => router,
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/create", post(products::create))
        .route("/{pk}", get(products::show))
        .route("/{pk}/update", put(products::update))
        .route("/{pk}/delete", delete(products::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/create", post(orders::create))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{pk}/remove", delete(cart::remove))
}

/// Create all API routes.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(credential_routes(rate_limiting))
        .route("/user", get(user::show).put(user::update))
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/cart", cart_routes())
}

/// Parse a path primary key. Non-numeric keys never match a row.
pub(crate) fn parse_pk(raw: &str) -> Option<i32> {
    raw.parse().ok()
}
