//! Keystall Storefront library.
//!
//! The customer-facing JSON API: accounts, catalog, checkout with payment
//! proof upload, and order polling. The binary in `main.rs` loads the
//! configuration and serves [`app`]; integration tests drive the same
//! router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    StorefrontSessionLayer, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Errors assembling the router.
#[derive(Debug, thiserror::Error)]
pub enum AppBuildError {
    /// The auth rate limiter quota was rejected.
    #[error("invalid auth rate limiter configuration")]
    RateLimiter,
}

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this router.
///
/// # Errors
///
/// Returns an error if the rate limiter cannot be configured.
pub fn app(
    state: AppState,
    session_layer: StorefrontSessionLayer,
) -> Result<Router, AppBuildError> {
    let auth_limiter = auth_rate_limiter().ok_or(AppBuildError::RateLimiter)?;
    let proof_max_bytes = state.config().checkout.proof_max_bytes;

    let api = routes::routes(auth_limiter, proof_max_bytes).layer(session_layer);

    Ok(Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::readiness))
        .merge(api)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        profile_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state))
}
