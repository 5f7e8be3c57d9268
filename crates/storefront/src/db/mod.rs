//! Database operations for the storefront.
//!
//! All tables live in the `shop` schema; sessions live in
//! `tower_sessions.session`. Connections set `search_path` to
//! `shop, public` so the enum types resolve by their bare names.
//!
//! The storefront reads the catalog, banners and premium content, and writes
//! only profiles and its own customers' orders.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! keystall migrate
//! ```

pub mod banners;
pub mod catalog;
pub mod orders;
pub mod premium;
pub mod profiles;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub use banners::BannerRepository;
pub use catalog::CatalogRepository;
pub use orders::{NewOrder, OrderRepository};
pub use premium::PremiumRepository;
pub use profiles::ProfileRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }

    /// Name of the violated unique constraint, if that is what failed.
    pub(crate) fn unique_constraint(err: &sqlx::Error) -> Option<&str> {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err.constraint(),
            _ => None,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .connect_with(connect_options(database_url)?)
        .await
}

/// Create a pool that connects on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid.
pub fn create_lazy_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    Ok(pool_options().connect_lazy_with(connect_options(database_url)?))
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}

fn connect_options(database_url: &SecretString) -> Result<PgConnectOptions, sqlx::Error> {
    Ok(PgConnectOptions::from_str(database_url.expose_secret())?
        .options([("search_path", "shop,public")]))
}
