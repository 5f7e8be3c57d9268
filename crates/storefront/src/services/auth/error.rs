//! Authentication error types.

use keystall_core::{EmailError, ValidationErrors};
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too short or too long.
    #[error("{0}")]
    WeakPassword(String),

    /// Display name empty or too long.
    #[error("{0}")]
    InvalidDisplayName(String),

    /// Wrong password or unknown email.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Email already registered.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Failures of ours rather than of the submitted form.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }

    /// The form field that caused the error, for 422 responses.
    #[must_use]
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::InvalidEmail(e) => Some(ValidationErrors::single("email", e.to_string())),
            Self::WeakPassword(msg) => Some(ValidationErrors::single("password", msg.clone())),
            Self::InvalidDisplayName(msg) => {
                Some(ValidationErrors::single("display_name", msg.clone()))
            }
            _ => None,
        }
    }
}
