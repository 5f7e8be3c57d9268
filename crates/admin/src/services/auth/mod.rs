//! Admin authentication and admin access management.
//!
//! Admins are profiles with a row in `admin_permissions`; they log in with
//! the profile's email and Argon2id password hash.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use keystall_core::{AdminRole, Email, Permissions, ProfileId};

use crate::db::{AdminUserRepository, Guarded, RepositoryError};
use crate::models::{AdminUser, NewAdminInput, PromoteInput, UpdateAdminInput};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length; bounds hashing cost.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin auth service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            admins: AdminUserRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for a wrong password or
    /// a profile without admin access.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (admin, password_hash) = self
            .admins
            .get_login(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        tracing::info!(profile_id = %admin.profile_id, role = %admin.role, "Admin logged in");
        Ok(admin)
    }

    /// Create a profile with admin access.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad input and
    /// `AdminAuthError::EmailTaken` if the email is registered.
    pub async fn create_admin(&self, input: &NewAdminInput) -> Result<AdminUser, AdminAuthError> {
        let email = input.validate().map_err(AdminAuthError::Invalid)?;
        validate_password(&input.password)?;
        let password_hash = hash_password(&input.password)?;
        let permissions = requested_permissions(input.role, input.permissions.as_ref());

        let admin = self
            .admins
            .create_with_access(
                &email,
                input.display_name.trim(),
                &password_hash,
                input.role,
                &permissions,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::EmailTaken,
                other => AdminAuthError::Repository(other),
            })?;

        tracing::info!(profile_id = %admin.profile_id, role = %admin.role, "Admin created");
        Ok(admin)
    }

    /// Create an admin on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::SuperAdminOnly` or
    /// `AdminAuthError::ExceedsOwnAccess` when `actor` may not grant the
    /// requested access, otherwise as [`Self::create_admin`].
    pub async fn create_admin_as(
        &self,
        actor: &AdminUser,
        input: &NewAdminInput,
    ) -> Result<AdminUser, AdminAuthError> {
        let permissions = requested_permissions(input.role, input.permissions.as_ref());
        authorize_grant(actor, None, input.role, &permissions)?;
        self.create_admin(input).await
    }

    /// Grant admin access to an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::ProfileNotFound` if no profile has the email
    /// and `AdminAuthError::LastSuperAdmin` when the last super admin would
    /// be demoted.
    pub async fn promote(&self, input: &PromoteInput) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(&input.email)?;
        let permissions = requested_permissions(input.role, input.permissions.as_ref());

        let profile_id = match self.admins.promote(&email, input.role, &permissions).await? {
            Guarded::Applied(profile_id) => profile_id.ok_or(AdminAuthError::ProfileNotFound)?,
            Guarded::LastSuperAdmin => return Err(AdminAuthError::LastSuperAdmin),
        };

        tracing::info!(profile_id = %profile_id, role = %input.role, "Profile promoted to admin");
        self.admins
            .get_by_profile_id(profile_id)
            .await?
            .ok_or(AdminAuthError::AdminNotFound)
    }

    /// Grant admin access to an existing profile on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::SelfChange` when `actor` names their own
    /// email, `AdminAuthError::SuperAdminOnly` or
    /// `AdminAuthError::ExceedsOwnAccess` when `actor` may not grant the
    /// requested access, otherwise as [`Self::promote`].
    pub async fn promote_as(
        &self,
        actor: &AdminUser,
        input: &PromoteInput,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(&input.email)?;
        if email == actor.email {
            return Err(AdminAuthError::SelfChange);
        }
        let current_role = self.admins.get_login(&email).await?.map(|(a, _)| a.role);
        let permissions = requested_permissions(input.role, input.permissions.as_ref());
        authorize_grant(actor, current_role, input.role, &permissions)?;

        let admin = self.promote(input).await?;
        tracing::info!(
            profile_id = %admin.profile_id,
            actor = %actor.profile_id,
            "Promotion granted by admin"
        );
        Ok(admin)
    }

    /// Change another admin's role and permissions.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::SelfChange` when `actor` targets themselves,
    /// `AdminAuthError::SuperAdminOnly` or `AdminAuthError::ExceedsOwnAccess`
    /// when `actor` may not grant the access, and
    /// `AdminAuthError::LastSuperAdmin` when the last super admin would be
    /// demoted.
    pub async fn update(
        &self,
        actor: &AdminUser,
        target: ProfileId,
        input: &UpdateAdminInput,
    ) -> Result<AdminUser, AdminAuthError> {
        if actor.profile_id == target {
            return Err(AdminAuthError::SelfChange);
        }
        let existing = self
            .admins
            .get_by_profile_id(target)
            .await?
            .ok_or(AdminAuthError::AdminNotFound)?;
        authorize_grant(actor, Some(existing.role), input.role, &input.permissions)?;

        let admin = match self
            .admins
            .update(target, input.role, &input.permissions)
            .await
            .map_err(not_found_as_admin)?
        {
            Guarded::Applied(admin) => admin,
            Guarded::LastSuperAdmin => return Err(AdminAuthError::LastSuperAdmin),
        };

        tracing::info!(
            profile_id = %target,
            role = %admin.role,
            actor = %actor.profile_id,
            "Admin access updated"
        );
        Ok(admin)
    }

    /// Revoke another admin's access. The profile stays as a customer.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::SelfChange` when `actor` targets themselves,
    /// `AdminAuthError::SuperAdminOnly` when a non super admin targets a
    /// super admin, and `AdminAuthError::LastSuperAdmin` for the last super
    /// admin.
    pub async fn revoke(&self, actor: &AdminUser, target: ProfileId) -> Result<(), AdminAuthError> {
        if actor.profile_id == target {
            return Err(AdminAuthError::SelfChange);
        }
        let existing = self
            .admins
            .get_by_profile_id(target)
            .await?
            .ok_or(AdminAuthError::AdminNotFound)?;
        if existing.role == AdminRole::SuperAdmin && actor.role != AdminRole::SuperAdmin {
            return Err(AdminAuthError::SuperAdminOnly);
        }

        match self.admins.revoke(target).await.map_err(not_found_as_admin)? {
            Guarded::Applied(()) => {}
            Guarded::LastSuperAdmin => return Err(AdminAuthError::LastSuperAdmin),
        }
        tracing::info!(profile_id = %target, actor = %actor.profile_id, "Admin access revoked");
        Ok(())
    }
}

/// The bag an admin ends up with: the explicit one, else the role default.
fn requested_permissions(role: AdminRole, permissions: Option<&Permissions>) -> Permissions {
    permissions
        .cloned()
        .unwrap_or_else(|| Permissions::default_for(role))
}

/// Check that `actor` may give an admin currently holding `current_role`
/// (`None` for a new admin) the role `new_role` with `permissions`.
///
/// Only super admins grant, change or remove the super admin role, and no
/// one grants a permission they do not hold themselves.
fn authorize_grant(
    actor: &AdminUser,
    current_role: Option<AdminRole>,
    new_role: AdminRole,
    permissions: &Permissions,
) -> Result<(), AdminAuthError> {
    if actor.role == AdminRole::SuperAdmin {
        return Ok(());
    }
    if new_role == AdminRole::SuperAdmin || current_role == Some(AdminRole::SuperAdmin) {
        return Err(AdminAuthError::SuperAdminOnly);
    }
    match permissions.first_not_held(actor.role, &actor.permissions) {
        Some((resource, action)) => Err(AdminAuthError::ExceedsOwnAccess { resource, action }),
        None => Ok(()),
    }
}

fn not_found_as_admin(err: RepositoryError) -> AdminAuthError {
    match err {
        RepositoryError::NotFound => AdminAuthError::AdminNotFound,
        other => AdminAuthError::Repository(other),
    }
}

/// Validate password length.
fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keystall_core::{Action, PermissionFlags, Resource};

    use super::*;

    #[test]
    fn test_password_rules() {
        assert!(matches!(
            validate_password("1234567"),
            Err(AdminAuthError::WeakPassword(_))
        ));
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("back office pass").unwrap();
        assert!(verify_password("back office pass", &hash).is_ok());
        assert!(matches!(
            verify_password("front office pass", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    fn admin(role: AdminRole, permissions: Permissions) -> AdminUser {
        AdminUser {
            profile_id: ProfileId::new(10),
            email: Email::parse("ops@keystall.test").unwrap(),
            display_name: "Ops".to_owned(),
            role,
            permissions,
            created_at: chrono::Utc::now(),
        }
    }

    fn user_manager() -> AdminUser {
        let mut bag = Permissions::default_for(AdminRole::Admin);
        bag.set(Resource::AdminUsers, PermissionFlags::ALL);
        admin(AdminRole::Admin, bag)
    }

    #[test]
    fn test_only_super_admins_grant_super_admin() {
        let actor = user_manager();
        let bag = Permissions::default_for(AdminRole::SuperAdmin);

        for current in [None, Some(AdminRole::Admin), Some(AdminRole::Moderator)] {
            assert!(matches!(
                authorize_grant(&actor, current, AdminRole::SuperAdmin, &bag),
                Err(AdminAuthError::SuperAdminOnly)
            ));
        }
        let super_admin = admin(AdminRole::SuperAdmin, Permissions::default());
        assert!(authorize_grant(&super_admin, None, AdminRole::SuperAdmin, &bag).is_ok());
    }

    #[test]
    fn test_only_super_admins_change_super_admins() {
        let actor = user_manager();
        let bag = Permissions::default_for(AdminRole::Moderator);
        assert!(matches!(
            authorize_grant(&actor, Some(AdminRole::SuperAdmin), AdminRole::Moderator, &bag),
            Err(AdminAuthError::SuperAdminOnly)
        ));
    }

    #[test]
    fn test_grants_limited_to_own_access() {
        let mut bag = Permissions::default();
        bag.set(Resource::AdminUsers, PermissionFlags::ALL);
        bag.set(Resource::Orders, PermissionFlags::VIEW);
        let actor = admin(AdminRole::Admin, bag);

        let admin_defaults = Permissions::default_for(AdminRole::Admin);
        assert!(matches!(
            authorize_grant(&actor, None, AdminRole::Admin, &admin_defaults),
            Err(AdminAuthError::ExceedsOwnAccess {
                resource: Resource::Products,
                action: Action::View,
            })
        ));

        let mut within = Permissions::default();
        within.set(Resource::Orders, PermissionFlags::VIEW);
        assert!(
            authorize_grant(&actor, Some(AdminRole::Moderator), AdminRole::Moderator, &within)
                .is_ok()
        );
        assert!(authorize_grant(&user_manager(), None, AdminRole::Admin, &admin_defaults).is_ok());
    }

    #[test]
    fn test_requested_permissions_default_to_role() {
        assert_eq!(
            requested_permissions(AdminRole::Moderator, None),
            Permissions::default_for(AdminRole::Moderator)
        );
        let explicit = Permissions::default();
        assert_eq!(
            requested_permissions(AdminRole::Admin, Some(&explicit)),
            explicit
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(AdminAuthError::PasswordHash.is_internal());
        assert!(!AdminAuthError::LastSuperAdmin.is_internal());
        assert!(!AdminAuthError::SuperAdminOnly.is_internal());
        let fields = AdminAuthError::WeakPassword("short".into())
            .field_errors()
            .unwrap();
        assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["password"]);
    }
}
