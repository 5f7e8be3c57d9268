//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! POST /api/auth/register                  - Create account and log in
//! POST /api/auth/login                     - Log in
//! POST /api/auth/logout                    - Log out
//! GET  /api/account                        - Profile, points, membership
//! GET  /api/banners                        - Live banners
//! GET  /api/products?category=             - Product listing
//! GET  /api/products/{slug}                - Product detail
//! GET  /api/premium/content                - Members-only content
//! POST /api/checkout                       - Multipart checkout
//! GET  /api/orders                         - Customer's orders
//! GET  /api/orders/{number}                - Order status
//! POST /api/orders/{number}/payment-proof  - Retry proof upload
//! GET  /media/{*path}                      - Product images
//! ```
//!
//! `/health` and `/health/ready` sit outside the API and skip the session.

pub mod account;
pub mod auth;
pub mod banners;
pub mod checkout;
pub mod health;
pub mod media;
pub mod premium;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Headroom for the non-file multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes(limiter: RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(limiter)
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the checkout and order routes router.
pub fn order_routes(proof_max_bytes: usize) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(proof_max_bytes + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/checkout", post(checkout::checkout))
        .route(
            "/orders/{number}/payment-proof",
            post(checkout::retry_payment_proof),
        )
        .layer(upload_limit)
        .route("/orders", get(checkout::list_orders))
        .route("/orders/{number}", get(checkout::show_order))
}

/// Create all routes for the storefront.
pub fn routes(auth_limiter: RateLimiterLayer, proof_max_bytes: usize) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes(auth_limiter))
        .route("/account", get(account::show))
        .route("/banners", get(banners::index))
        .nest("/products", product_routes())
        .route("/premium/content", get(premium::content))
        .merge(order_routes(proof_max_bytes));

    Router::new()
        .nest("/api", api)
        .route("/media/{*path}", get(media::show))
}
