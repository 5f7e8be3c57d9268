//! Admin access repository.
//!
//! Admin access is a row in `admin_permissions` keyed by profile; the
//! profile carries the email, display name and password hash.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use keystall_core::{AdminRole, Email, Permissions, ProfileId};

use super::RepositoryError;
use crate::models::AdminUser;

const ADMIN_COLUMNS: &str = r"
    p.id AS profile_id, p.email, p.display_name, a.role, a.permissions,
    a.created_at
";

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    profile_id: ProfileId,
    email: Email,
    display_name: String,
    role: AdminRole,
    permissions: Json<Permissions>,
    created_at: DateTime<Utc>,
}

impl From<AdminUserRow> for AdminUser {
    fn from(row: AdminUserRow) -> Self {
        Self {
            profile_id: row.profile_id,
            email: row.email,
            display_name: row.display_name,
            role: row.role,
            permissions: row.permissions.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    #[sqlx(flatten)]
    admin: AdminUserRow,
    password_hash: String,
}

/// Outcome of an access change that must leave at least one super admin.
#[derive(Debug, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The change was written.
    Applied(T),
    /// The change would have removed the last super admin; nothing was written.
    LastSuperAdmin,
}

/// Repository for admin access.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Admin and password hash for a login attempt.
    ///
    /// Profiles without admin access are not returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_login(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ADMIN_COLUMNS}, p.password_hash
            FROM shop.admin_permissions a
            JOIN shop.profiles p ON p.id = a.profile_id
            WHERE p.email = $1
            "
        );
        let row = sqlx::query_as::<_, LoginRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| (r.admin.into(), r.password_hash)))
    }

    /// Admin by profile ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_profile_id(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ADMIN_COLUMNS}
            FROM shop.admin_permissions a
            JOIN shop.profiles p ON p.id = a.profile_id
            WHERE a.profile_id = $1
            "
        );
        let row = sqlx::query_as::<_, AdminUserRow>(&sql)
            .bind(profile_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(AdminUser::from))
    }

    /// All admins, oldest grant first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ADMIN_COLUMNS}
            FROM shop.admin_permissions a
            JOIN shop.profiles p ON p.id = a.profile_id
            ORDER BY a.created_at, a.profile_id
            "
        );
        let rows = sqlx::query_as::<_, AdminUserRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(AdminUser::from).collect())
    }

    /// Create a profile and grant it admin access in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_with_access(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
        role: AdminRole,
        permissions: &Permissions,
    ) -> Result<AdminUser, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let profile_id: ProfileId = sqlx::query_scalar(
            r"
            INSERT INTO shop.profiles (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "email already exists"))?;

        sqlx::query(
            r"
            INSERT INTO shop.admin_permissions (profile_id, role, permissions)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(profile_id)
        .bind(role)
        .bind(Json(permissions))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_profile_id(profile_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Grant (or replace) admin access for an existing profile.
    ///
    /// Returns `Guarded::Applied(None)` when no profile has the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promote(
        &self,
        email: &Email,
        role: AdminRole,
        permissions: &Permissions,
    ) -> Result<Guarded<Option<ProfileId>>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let super_admins = lock_super_admins(&mut *tx).await?;

        let target: Option<ProfileId> =
            sqlx::query_scalar("SELECT id FROM shop.profiles WHERE email = $1")
                .bind(email)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(target) = target else {
            return Ok(Guarded::Applied(None));
        };
        if !keeps_a_super_admin(&super_admins, target, Some(role)) {
            return Ok(Guarded::LastSuperAdmin);
        }

        let profile_id: Option<ProfileId> =
            sqlx::query_scalar("SELECT shop.promote_to_admin($1, $2, $3)")
                .bind(email)
                .bind(role)
                .bind(Json(permissions))
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;

        Ok(Guarded::Applied(profile_id))
    }

    /// Change an admin's role and permission bag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile has no admin access.
    pub async fn update(
        &self,
        profile_id: ProfileId,
        role: AdminRole,
        permissions: &Permissions,
    ) -> Result<Guarded<AdminUser>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let super_admins = lock_super_admins(&mut *tx).await?;
        if !keeps_a_super_admin(&super_admins, profile_id, Some(role)) {
            return Ok(Guarded::LastSuperAdmin);
        }

        let result = sqlx::query(
            r"
            UPDATE shop.admin_permissions
            SET role = $2, permissions = $3
            WHERE profile_id = $1
            ",
        )
        .bind(profile_id)
        .bind(role)
        .bind(Json(permissions))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;

        self.get_by_profile_id(profile_id)
            .await?
            .map(Guarded::Applied)
            .ok_or(RepositoryError::NotFound)
    }

    /// Remove admin access. The profile itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile has no admin access.
    pub async fn revoke(&self, profile_id: ProfileId) -> Result<Guarded<()>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let super_admins = lock_super_admins(&mut *tx).await?;
        if !keeps_a_super_admin(&super_admins, profile_id, None) {
            return Ok(Guarded::LastSuperAdmin);
        }

        let result = sqlx::query("DELETE FROM shop.admin_permissions WHERE profile_id = $1")
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(Guarded::Applied(()))
    }
}

/// Lock every super admin row until the transaction ends.
///
/// Concurrent demotions and revocations queue here, so each one sees the
/// super admins left by the others.
async fn lock_super_admins(conn: &mut PgConnection) -> Result<Vec<ProfileId>, RepositoryError> {
    let ids = sqlx::query_scalar(
        r"
        SELECT profile_id
        FROM shop.admin_permissions
        WHERE role = 'super_admin'
        ORDER BY profile_id
        FOR UPDATE
        ",
    )
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// Whether giving `target` the role `new_role` (`None` revokes access)
/// leaves at least one of `super_admins` in place.
fn keeps_a_super_admin(
    super_admins: &[ProfileId],
    target: ProfileId,
    new_role: Option<AdminRole>,
) -> bool {
    !super_admins.contains(&target)
        || new_role == Some(AdminRole::SuperAdmin)
        || super_admins.len() > 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_last_super_admin_is_kept() {
        let only = [ProfileId::new(1)];
        assert!(!keeps_a_super_admin(&only, ProfileId::new(1), None));
        assert!(!keeps_a_super_admin(&only, ProfileId::new(1), Some(AdminRole::Admin)));
        assert!(keeps_a_super_admin(&only, ProfileId::new(1), Some(AdminRole::SuperAdmin)));
        assert!(keeps_a_super_admin(&only, ProfileId::new(2), None));

        let two = [ProfileId::new(1), ProfileId::new(2)];
        assert!(keeps_a_super_admin(&two, ProfileId::new(1), None));
        assert!(keeps_a_super_admin(&two, ProfileId::new(2), Some(AdminRole::Moderator)));
    }

    #[test]
    fn test_no_super_admins_blocks_nothing() {
        assert!(keeps_a_super_admin(&[], ProfileId::new(5), None));
    }
}
