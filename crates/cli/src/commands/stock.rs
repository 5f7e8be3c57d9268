//! Stock key maintenance.

use keystall_admin::db::StockKeyRepository;

use super::connect;

/// Expire available keys whose `expires_at` has passed.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn expire() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let expired = StockKeyRepository::new(&pool).expire_due().await?;
    tracing::info!(expired, "Stock keys expired");
    Ok(())
}
