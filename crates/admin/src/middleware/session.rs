//! Session middleware configuration for admin.
//!
//! Sessions share the `tower_sessions.session` table with the storefront
//! but use their own cookie name and signing secret, a shorter inactivity
//! expiry and `SameSite=Strict`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "keystall_admin_session";

/// Session expiry after inactivity, in seconds (12 hours).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// Session layer with a signed cookie.
pub type AdminSessionLayer = SessionManagerLayer<PostgresStore, SignedCookie>;

/// The session secret could not be turned into a signing key.
#[derive(Debug, thiserror::Error)]
#[error("session secret is not usable as a signing key: {0}")]
pub struct SessionKeyError(String);

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns an error if the session secret is too short for a signing key.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<AdminSessionLayer, SessionKeyError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    let store = PostgresStore::new(pool.clone());

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
