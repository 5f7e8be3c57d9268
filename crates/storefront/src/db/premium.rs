//! Premium membership and content reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keystall_core::ProfileId;

use super::RepositoryError;
use crate::models::PremiumContent;
use crate::models::profile::MembershipView;

/// Repository for premium memberships and content.
pub struct PremiumRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PremiumRepository<'a> {
    /// Create a new premium repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The membership running at `now`, if any.
    ///
    /// With several overlapping memberships the one lasting longest wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_membership(
        &self,
        profile_id: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<Option<MembershipView>, RepositoryError> {
        let row: Option<(DateTime<Utc>, Option<DateTime<Utc>>)> = sqlx::query_as(
            r"
            SELECT starts_at, expires_at
            FROM shop.premium_memberships
            WHERE profile_id = $1
              AND is_active
              AND starts_at <= $2
              AND (expires_at IS NULL OR expires_at > $2)
            ORDER BY expires_at DESC NULLS FIRST
            LIMIT 1
            ",
        )
        .bind(profile_id)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(starts_at, expires_at)| MembershipView {
            starts_at,
            expires_at,
        }))
    }

    /// Whether the profile is a member at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_member(
        &self,
        profile_id: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.active_membership(profile_id, now).await?.is_some())
    }

    /// Published content, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_content(&self) -> Result<Vec<PremiumContent>, RepositoryError> {
        let content = sqlx::query_as::<_, PremiumContent>(
            r"
            SELECT id, title, body, product_id, updated_at
            FROM shop.premium_content
            WHERE is_published
            ORDER BY updated_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(content)
    }
}
