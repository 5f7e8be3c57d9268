//! Stock key repository.
//!
//! Assignment to orders happens only through
//! `shop.assign_stock_key_to_order`, inside the approval transaction.
//! This repository covers everything else: import, listing, revocation and
//! expiry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keystall_core::{OrderId, ProductId, StockKeyId, StockKeyStatus, VariantId};

use super::RepositoryError;
use crate::models::stock_key::mask_secret;
use crate::models::{ImportBatch, ImportResult, StockCountRow, StockKey};

const KEY_COLUMNS: &str = r"
    id, product_id, variant_id, secret, note, status, order_id, assigned_at,
    expires_at, created_at
";

#[derive(sqlx::FromRow)]
struct StockKeyRow {
    id: StockKeyId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    secret: String,
    note: Option<String>,
    status: StockKeyStatus,
    order_id: Option<OrderId>,
    assigned_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<StockKeyRow> for StockKey {
    fn from(row: StockKeyRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            secret_hint: mask_secret(&row.secret),
            note: row.note,
            status: row.status,
            order_id: row.order_id,
            assigned_at: row.assigned_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for stock keys.
pub struct StockKeyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockKeyRepository<'a> {
    /// Create a new stock key repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Keys of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<StockKey>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {KEY_COLUMNS}
            FROM shop.product_stock_keys
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            "
        );
        let rows = sqlx::query_as::<_, StockKeyRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(StockKey::from).collect())
    }

    /// Insert a batch of keys. Keys the product already has are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not belong to
    /// the product and `RepositoryError::Conflict` if the product does not
    /// exist.
    pub async fn bulk_import(
        &self,
        product_id: ProductId,
        batch: &ImportBatch,
    ) -> Result<ImportResult, RepositoryError> {
        if let Some(variant_id) = batch.variant_id {
            let belongs: bool = sqlx::query_scalar(
                r"
                SELECT EXISTS (
                    SELECT 1 FROM shop.product_variants WHERE id = $1 AND product_id = $2
                )
                ",
            )
            .bind(variant_id)
            .bind(product_id)
            .fetch_one(self.pool)
            .await?;
            if !belongs {
                return Err(RepositoryError::NotFound);
            }
        }

        let result = sqlx::query(
            r"
            INSERT INTO shop.product_stock_keys (product_id, variant_id, secret, note, expires_at)
            SELECT $1, $2, secret, $4, $5
            FROM unnest($3::text[]) AS secret
            ON CONFLICT (product_id, secret) DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(batch.variant_id)
        .bind(&batch.secrets)
        .bind(batch.note.as_deref())
        .bind(batch.expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product does not exist"))?;

        let inserted = result.rows_affected();
        let submitted = u64::try_from(batch.secrets.len() + batch.repeated).unwrap_or(u64::MAX);
        Ok(ImportResult {
            inserted,
            skipped: submitted.saturating_sub(inserted),
        })
    }

    /// Revoke an available or assigned key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID and
    /// `RepositoryError::Conflict` if the key is already expired or revoked.
    pub async fn revoke(&self, id: StockKeyId) -> Result<StockKey, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.product_stock_keys
            SET status = 'revoked'
            WHERE id = $1 AND status IN ('available', 'assigned')
            RETURNING {KEY_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StockKeyRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        let status: Option<StockKeyStatus> =
            sqlx::query_scalar("SELECT status FROM shop.product_stock_keys WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        match status {
            Some(status) => Err(RepositoryError::Conflict(format!("key is already {status}"))),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Mark available keys past their expiry as expired.
    ///
    /// Returns the number of keys expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn expire_due(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product_stock_keys
            SET status = 'expired'
            WHERE status = 'available' AND expires_at <= now()
            ",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Available, unexpired keys per product and variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<Vec<StockCountRow>, RepositoryError> {
        let rows: Vec<(ProductId, Option<VariantId>, i64)> = sqlx::query_as(
            r"
            SELECT stock_product_id, stock_variant_id, available_count
            FROM shop.product_stock_counts()
            ORDER BY stock_product_id, stock_variant_id NULLS FIRST
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, variant_id, available)| StockCountRow {
                product_id,
                variant_id,
                available,
            })
            .collect())
    }
}
