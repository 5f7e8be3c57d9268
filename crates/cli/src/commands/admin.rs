//! Admin access commands.
//!
//! These go through the same service as the admin API, so the same email,
//! password and role rules apply.

use keystall_admin::models::{NewAdminInput, PromoteInput};
use keystall_admin::services::{AdminAuthError, AdminAuthService};
use keystall_core::AdminRole;
use thiserror::Error;

use super::{CommandError, connect};

/// Errors managing admin access.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Create a profile with admin access and the role's default permissions.
///
/// # Errors
///
/// Returns an error for invalid input, a taken email, or a database failure.
pub async fn create(
    email: String,
    display_name: String,
    role: AdminRole,
    password: String,
) -> Result<(), AdminError> {
    let pool = connect().await?;
    let input = NewAdminInput {
        email,
        display_name,
        password,
        role,
        permissions: None,
    };

    let admin = AdminAuthService::new(&pool)
        .create_admin(&input)
        .await
        .inspect_err(log_field_errors)?;

    tracing::info!(
        "Admin created! Profile: {}, Email: {}, Role: {}",
        admin.profile_id,
        admin.email,
        admin.role
    );
    Ok(())
}

/// Give an existing customer admin access.
///
/// # Errors
///
/// Returns an error if no profile has the email or the database fails.
pub async fn promote(email: String, role: AdminRole) -> Result<(), AdminError> {
    let pool = connect().await?;
    let input = PromoteInput {
        email,
        role,
        permissions: None,
    };

    let admin = AdminAuthService::new(&pool)
        .promote(&input)
        .await
        .inspect_err(log_field_errors)?;

    tracing::info!(
        "Profile promoted! Profile: {}, Email: {}, Role: {}",
        admin.profile_id,
        admin.email,
        admin.role
    );
    Ok(())
}

fn log_field_errors(err: &AdminAuthError) {
    if let Some(errors) = err.field_errors() {
        for error in errors.iter() {
            tracing::error!("  - {}: {}", error.field, error.message);
        }
    }
}
