//! Admin authentication error types.

use thiserror::Error;

use keystall_core::{Action, EmailError, Resource, ValidationErrors};

use crate::db::RepositoryError;

/// Errors from admin login and admin access management.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too short or too long.
    #[error("{0}")]
    WeakPassword(String),

    /// One or more form fields are invalid.
    #[error("invalid admin details")]
    Invalid(ValidationErrors),

    /// Wrong email or password, or the profile has no admin access.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A profile already uses the email.
    #[error("email is already registered")]
    EmailTaken,

    /// No profile has the email.
    #[error("no account with that email")]
    ProfileNotFound,

    /// The profile has no admin access.
    #[error("admin user not found")]
    AdminNotFound,

    /// The change would leave no super admin.
    #[error("at least one super admin must remain")]
    LastSuperAdmin,

    /// Admins cannot change or revoke their own access.
    #[error("you cannot change your own access")]
    SelfChange,

    /// Only a super admin may grant, change or remove super admin access.
    #[error("only a super admin can grant or change super admin access")]
    SuperAdminOnly,

    /// The grant includes a permission the acting admin does not hold.
    #[error("you cannot grant {action} on {resource} without holding it")]
    ExceedsOwnAccess { resource: Resource, action: Action },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}

impl AdminAuthError {
    /// Server-side failures that are reported and hidden from clients.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }

    /// Field errors for 422 responses.
    #[must_use]
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::InvalidEmail(e) => Some(ValidationErrors::single("email", e.to_string())),
            Self::WeakPassword(msg) => Some(ValidationErrors::single("password", msg.clone())),
            Self::Invalid(errors) => Some(errors.clone()),
            _ => None,
        }
    }
}
