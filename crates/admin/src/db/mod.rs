//! Database operations for the admin back-office.
//!
//! The admin binary owns every write to the catalog, stock keys, banners,
//! premium records, admin access and order verification. All tables live
//! in the `shop` schema; connections put `shop` on the `search_path` so the
//! enum types resolve by their bare names.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! keystall migrate
//! ```

pub mod admin_users;
pub mod banners;
pub mod dashboard;
pub mod orders;
pub mod premium;
pub mod products;
pub mod stock_keys;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

pub use admin_users::{AdminUserRepository, Guarded};
pub use banners::BannerRepository;
pub use dashboard::DashboardRepository;
pub use orders::OrderRepository;
pub use premium::PremiumRepository;
pub use products::ProductRepository;
pub use stock_keys::StockKeyRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug, referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign key violations to `Conflict` with `message`,
    /// anything else to `Database`.
    pub(crate) fn from_constraint(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
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
