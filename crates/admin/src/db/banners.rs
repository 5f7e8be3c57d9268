//! Banner repository.

use sqlx::PgPool;

use keystall_core::BannerId;

use super::RepositoryError;
use crate::models::{Banner, BannerInput};

const BANNER_COLUMNS: &str = r"
    id, title, subtitle, gradient, icon, link_url, starts_at, ends_at,
    is_active, sort_order, created_at, updated_at
";

/// Repository for promotional banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every banner in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Banner>, RepositoryError> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM shop.banner_posts ORDER BY sort_order, id");
        let banners = sqlx::query_as::<_, Banner>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(banners)
    }

    /// Create a banner at the end of the display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.banner_posts (
                title, subtitle, gradient, icon, link_url, starts_at, ends_at,
                is_active, sort_order
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8,
                   COALESCE(MAX(sort_order) + 1, 0)
            FROM shop.banner_posts
            RETURNING {BANNER_COLUMNS}
            "
        );
        let banner = sqlx::query_as::<_, Banner>(&sql)
            .bind(&input.title)
            .bind(input.subtitle.as_deref())
            .bind(&input.gradient)
            .bind(&input.icon)
            .bind(input.link_url.as_deref())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await?;
        Ok(banner)
    }

    /// Replace a banner's content and schedule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn update(
        &self,
        id: BannerId,
        input: &BannerInput,
    ) -> Result<Banner, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.banner_posts
            SET title = $2, subtitle = $3, gradient = $4, icon = $5, link_url = $6,
                starts_at = $7, ends_at = $8, is_active = $9
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "
        );
        sqlx::query_as::<_, Banner>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(input.subtitle.as_deref())
            .bind(&input.gradient)
            .bind(&input.icon)
            .bind(input.link_url.as_deref())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Show or hide a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn set_active(
        &self,
        id: BannerId,
        is_active: bool,
    ) -> Result<Banner, RepositoryError> {
        let sql = format!(
            "UPDATE shop.banner_posts SET is_active = $2 WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        );
        sqlx::query_as::<_, Banner>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.banner_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Rewrite the display order. `ids` must list every banner exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `ids` does not match the
    /// current set of banners.
    pub async fn reorder(&self, ids: &[BannerId]) -> Result<Vec<Banner>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(BannerId::as_i32).collect();
        let mut tx = self.pool.begin().await?;

        let existing: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM shop.banner_posts ORDER BY id FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        let mut requested = ids.clone();
        requested.sort_unstable();
        requested.dedup();
        if requested != existing || requested.len() != ids.len() {
            return Err(RepositoryError::Conflict(
                "order must list every banner exactly once".to_owned(),
            ));
        }

        sqlx::query(
            r"
            UPDATE shop.banner_posts b
            SET sort_order = o.position::integer - 1
            FROM unnest($1::integer[]) WITH ORDINALITY AS o(id, position)
            WHERE b.id = o.id
            ",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.list().await
    }
}
