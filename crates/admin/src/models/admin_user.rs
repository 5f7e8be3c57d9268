//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystall_core::{Email, Permissions, ProfileId, ValidationErrors};

pub use keystall_core::AdminRole;

/// A profile with admin access (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    /// Profile the access belongs to.
    pub profile_id: ProfileId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub display_name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// Per-resource grants; ignored for super admins.
    pub permissions: Permissions,
    /// When admin access was granted.
    pub created_at: DateTime<Utc>,
}

/// `POST /api/admin-users` body: new profile plus admin access.
#[derive(Debug, Deserialize)]
pub struct NewAdminInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: AdminRole,
    /// Defaults to the role's default bag.
    pub permissions: Option<Permissions>,
}

/// `POST /api/admin-users/promote` body.
#[derive(Debug, Deserialize)]
pub struct PromoteInput {
    pub email: String,
    pub role: AdminRole,
    pub permissions: Option<Permissions>,
}

/// `PUT /api/admin-users/{id}` body.
#[derive(Debug, Deserialize)]
pub struct UpdateAdminInput {
    pub role: AdminRole,
    pub permissions: Permissions,
}

/// Maximum display name length.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 80;

impl NewAdminInput {
    /// Check the non-password fields.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.check("email", Email::parse(&self.email));
        errors.require("display_name", &self.display_name);
        errors.max_len("display_name", self.display_name.trim(), MAX_DISPLAY_NAME_LENGTH);
        errors.into_result()?;
        email.ok_or_else(|| ValidationErrors::single("email", "is invalid"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_admin_validation() {
        let input = NewAdminInput {
            email: "not-an-email".to_owned(),
            display_name: " ".to_owned(),
            password: "longenough".to_owned(),
            role: AdminRole::Moderator,
            permissions: None,
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "display_name"]);

        let input = NewAdminInput {
            email: "Ops@Keystall.test".to_owned(),
            display_name: "Ops".to_owned(),
            ..input
        };
        assert_eq!(input.validate().unwrap().as_str(), "ops@keystall.test");
    }
}
