//! Premium memberships, product rules and content.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keystall_core::{
    Email, MembershipId, PremiumAccess, PremiumContentId, PremiumRule, ProductId, ProfileId,
};

use super::RepositoryError;
use crate::models::{Membership, PremiumContent, PremiumContentInput, PremiumProduct};

const MEMBERSHIP_COLUMNS: &str = r"
    m.id, m.profile_id, p.email, m.starts_at, m.expires_at, m.is_active,
    m.granted_by, m.created_at
";

const CONTENT_COLUMNS: &str = "id, title, body, product_id, is_published, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: MembershipId,
    profile_id: ProfileId,
    email: Email,
    starts_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    granted_by: Option<ProfileId>,
    created_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Self {
            id: row.id,
            profile_id: row.profile_id,
            email: row.email,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            granted_by: row.granted_by,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PremiumProductRow {
    product_id: ProductId,
    product_name: String,
    access: PremiumAccess,
    discount_percent: Option<i16>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PremiumProductRow> for PremiumProduct {
    type Error = RepositoryError;

    fn try_from(row: PremiumProductRow) -> Result<Self, Self::Error> {
        let discount_percent = row
            .discount_percent
            .map(u8::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "discount percent out of range for product {}",
                    row.product_id
                ))
            })?;
        Ok(Self {
            product_id: row.product_id,
            product_name: row.product_name,
            access: row.access,
            discount_percent,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for premium records.
pub struct PremiumRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PremiumRepository<'a> {
    /// Create a new premium repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every membership, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_memberships(&self) -> Result<Vec<Membership>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM shop.premium_memberships m
            JOIN shop.profiles p ON p.id = m.profile_id
            ORDER BY m.created_at DESC, m.id DESC
            "
        );
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Membership::from).collect())
    }

    /// Grant a membership to the profile with `email`.
    ///
    /// Returns `None` when no profile has the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn grant_membership(
        &self,
        email: &Email,
        expires_at: Option<DateTime<Utc>>,
        granted_by: ProfileId,
    ) -> Result<Option<Membership>, RepositoryError> {
        let sql = format!(
            r"
            WITH granted AS (
                INSERT INTO shop.premium_memberships (profile_id, expires_at, granted_by)
                SELECT id, $2, $3 FROM shop.profiles WHERE email = $1
                RETURNING *
            )
            SELECT {MEMBERSHIP_COLUMNS}
            FROM granted m
            JOIN shop.profiles p ON p.id = m.profile_id
            "
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(email)
            .bind(expires_at)
            .bind(granted_by)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Membership::from))
    }

    /// End a membership now. The row is kept for history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active membership has the ID.
    pub async fn revoke_membership(&self, id: MembershipId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.premium_memberships SET is_active = false WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Products with a premium rule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<PremiumProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, PremiumProductRow>(
            r"
            SELECT pp.product_id, pr.name AS product_name, pp.access,
                   pp.discount_percent, pp.updated_at
            FROM shop.premium_products pp
            JOIN shop.products pr ON pr.id = pp.product_id
            ORDER BY pr.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PremiumProduct::try_from).collect()
    }

    /// Create or replace a product's premium rule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist.
    pub async fn set_product_rule(
        &self,
        product_id: ProductId,
        rule: PremiumRule,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.premium_products (product_id, access, discount_percent)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id)
            DO UPDATE SET access = EXCLUDED.access,
                          discount_percent = EXCLUDED.discount_percent,
                          updated_at = now()
            ",
        )
        .bind(product_id)
        .bind(rule.access)
        .bind(rule.discount_percent.map(i16::from))
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product does not exist"))?;

        Ok(())
    }

    /// Remove a product's premium rule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product has no rule.
    pub async fn remove_product_rule(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.premium_products WHERE product_id = $1")
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// All premium content, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_content(&self) -> Result<Vec<PremiumContent>, RepositoryError> {
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM shop.premium_content ORDER BY updated_at DESC, id DESC"
        );
        let content = sqlx::query_as::<_, PremiumContent>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(content)
    }

    /// Create premium content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the linked product does not exist.
    pub async fn create_content(
        &self,
        input: &PremiumContentInput,
    ) -> Result<PremiumContent, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.premium_content (title, body, product_id, is_published)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONTENT_COLUMNS}
            "
        );
        let content = sqlx::query_as::<_, PremiumContent>(&sql)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.product_id)
            .bind(input.is_published)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product does not exist"))?;
        Ok(content)
    }

    /// Replace premium content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn update_content(
        &self,
        id: PremiumContentId,
        input: &PremiumContentInput,
    ) -> Result<PremiumContent, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.premium_content
            SET title = $2, body = $3, product_id = $4, is_published = $5
            WHERE id = $1
            RETURNING {CONTENT_COLUMNS}
            "
        );
        sqlx::query_as::<_, PremiumContent>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.product_id)
            .bind(input.is_published)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product does not exist"))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete premium content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete_content(&self, id: PremiumContentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.premium_content WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
