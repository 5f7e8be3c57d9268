//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! POST   /auth/login                         - Log in
//! POST   /auth/logout                        - Log out
//! GET    /auth/me                            - Current admin
//! GET    /api/dashboard                      - Counters
//! GET    /api/products                       - All products
//! POST   /api/products                       - Create product
//! GET    /api/products/{id}                  - Product with variants
//! PUT    /api/products/{id}                  - Update product
//! DELETE /api/products/{id}                  - Delete product
//! POST   /api/products/{id}/active           - Show or hide
//! POST   /api/products/{id}/image            - Replace image (multipart)
//! GET    /api/products/{id}/variants         - Variants
//! POST   /api/products/{id}/variants         - Add variant
//! PUT    /api/variants/{id}                  - Update variant
//! DELETE /api/variants/{id}                  - Delete variant
//! GET    /api/products/{id}/stock-keys       - Keys (masked)
//! POST   /api/products/{id}/stock-keys       - Bulk import
//! POST   /api/stock-keys/{id}/revoke         - Revoke key
//! POST   /api/stock-keys/expire              - Expire due keys
//! GET    /api/stock-counts                   - Available keys
//! GET    /api/orders?status=                 - Order queue
//! GET    /api/orders/{id}                    - Order detail
//! GET    /api/orders/{id}/payment-proof      - Proof image
//! POST   /api/orders/{id}/approve            - Approve and deliver
//! POST   /api/orders/{id}/reject             - Reject
//! GET    /api/exports/orders.csv             - Orders CSV
//! GET    /api/exports/products.csv           - Products CSV
//! GET    /api/banners                        - Banners
//! POST   /api/banners                        - Create banner
//! PUT    /api/banners/order                  - Reorder
//! PUT    /api/banners/{id}                   - Update banner
//! DELETE /api/banners/{id}                   - Delete banner
//! POST   /api/banners/{id}/active            - Show or hide
//! GET    /api/admin-users                    - Admins
//! POST   /api/admin-users                    - Create admin
//! POST   /api/admin-users/promote            - Promote customer
//! PUT    /api/admin-users/{id}               - Change role/permissions
//! DELETE /api/admin-users/{id}               - Revoke access
//! GET    /api/premium/memberships            - Memberships
//! POST   /api/premium/memberships            - Grant
//! DELETE /api/premium/memberships/{id}       - Revoke
//! GET    /api/premium/products               - Product rules
//! PUT    /api/premium/products/{product_id}  - Set rule
//! DELETE /api/premium/products/{product_id}  - Remove rule
//! GET    /api/premium/content                - Content
//! POST   /api/premium/content                - Create content
//! PUT    /api/premium/content/{id}           - Update content
//! DELETE /api/premium/content/{id}           - Delete content
//! ```
//!
//! `/health` and `/health/ready` sit outside and skip the session.

pub mod admin_users;
pub mod auth;
pub mod banners;
pub mod dashboard;
pub mod exports;
pub mod health;
pub mod orders;
pub mod premium;
pub mod products;
pub mod stock_keys;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Headroom for the non-file multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes(limiter: RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .layer(limiter)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog and stock routes router.
pub fn product_routes(image_max_bytes: usize) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(image_max_bytes + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/products/{id}/image", post(products::upload_image))
        .layer(upload_limit)
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/active", post(products::set_active))
        .route(
            "/products/{id}/variants",
            get(products::variants).post(products::create_variant),
        )
        .route(
            "/variants/{id}",
            put(products::update_variant).delete(products::delete_variant),
        )
        .route(
            "/products/{id}/stock-keys",
            get(stock_keys::index).post(stock_keys::import),
        )
        .route("/stock-keys/{id}/revoke", post(stock_keys::revoke))
        .route("/stock-keys/expire", post(stock_keys::expire))
        .route("/stock-counts", get(stock_keys::counts))
}

/// Create the order queue routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/payment-proof", get(orders::payment_proof))
        .route("/{id}/approve", post(orders::approve))
        .route("/{id}/reject", post(orders::reject))
}

/// Create the banner routes router.
pub fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::index).post(banners::create))
        .route("/order", put(banners::reorder))
        .route("/{id}", put(banners::update).delete(banners::delete))
        .route("/{id}/active", post(banners::set_active))
}

/// Create the admin account routes router.
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::create))
        .route("/promote", post(admin_users::promote))
        .route(
            "/{id}",
            put(admin_users::update).delete(admin_users::revoke),
        )
}

/// Create the premium routes router.
pub fn premium_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/memberships",
            get(premium::memberships).post(premium::grant_membership),
        )
        .route("/memberships/{id}", delete(premium::revoke_membership))
        .route("/products", get(premium::products))
        .route(
            "/products/{product_id}",
            put(premium::set_product_rule).delete(premium::remove_product_rule),
        )
        .route(
            "/content",
            get(premium::content).post(premium::create_content),
        )
        .route(
            "/content/{id}",
            put(premium::update_content).delete(premium::delete_content),
        )
}

/// Create all routes for admin.
pub fn routes(auth_limiter: RateLimiterLayer, image_max_bytes: usize) -> Router<AppState> {
    let api = Router::new()
        .route("/dashboard", get(dashboard::show))
        .merge(product_routes(image_max_bytes))
        .nest("/orders", order_routes())
        .route("/exports/orders.csv", get(exports::orders))
        .route("/exports/products.csv", get(exports::products))
        .nest("/banners", banner_routes())
        .nest("/admin-users", admin_user_routes())
        .nest("/premium", premium_routes());

    Router::new()
        .nest("/auth", auth_routes(auth_limiter))
        .nest("/api", api)
}
