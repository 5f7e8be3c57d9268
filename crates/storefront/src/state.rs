//! Application state shared across handlers.

use std::sync::Arc;

use keystall_media::MediaStore;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::SubmissionLimiter;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    media: MediaStore,
    checkout_limiter: SubmissionLimiter,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, media: MediaStore) -> Self {
        let checkout_limiter =
            SubmissionLimiter::new(config.checkout.rate_limit, config.checkout.rate_window);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                checkout_limiter,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Object storage for product images and payment proofs.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Per-session checkout submission limiter.
    #[must_use]
    pub fn checkout_limiter(&self) -> &SubmissionLimiter {
        &self.inner.checkout_limiter
    }
}
