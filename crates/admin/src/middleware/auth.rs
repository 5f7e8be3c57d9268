//! Authentication extractors for admin.
//!
//! The session holds only the admin's identity. [`RequireAdminAuth`]
//! reloads role and permissions from the database on every request, so a
//! revoked or downgraded admin loses access immediately.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use keystall_core::{Action, Resource};

use crate::db::AdminUserRepository;
use crate::error::AppError;
use crate::models::{AdminUser, CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in admin with current access.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(admin: RequireAdminAuth) -> Result<Json<()>> {
///     admin.require(Resource::Orders, Action::Edit)?;
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdminAuth(pub AdminUser);

impl RequireAdminAuth {
    /// Check that the admin may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the permission is missing.
    pub fn require(&self, resource: Resource, action: Action) -> Result<(), AppError> {
        let admin = &self.0;
        if admin.permissions.allows(admin.role, resource, action) {
            return Ok(());
        }
        tracing::warn!(
            profile_id = %admin.profile_id,
            resource = ?resource,
            action = ?action,
            "Permission denied"
        );
        Err(AppError::Forbidden(
            "You do not have permission to do that".to_owned(),
        ))
    }
}

/// Rejection when no admin is logged in or access was revoked.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// No session or no admin in it.
    Unauthorized,
    /// Access could not be checked.
    Internal,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please log in to continue" })),
            )
                .into_response(),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let current: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = AdminUserRepository::new(state.pool())
            .get_by_profile_id(current.profile_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load admin access");
                AdminAuthRejection::Internal
            })?;

        let Some(admin) = admin else {
            tracing::info!(
                profile_id = %current.profile_id,
                "Admin access revoked; ending session"
            );
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to end session");
            }
            return Err(AdminAuthRejection::Unauthorized);
        };

        tracing::Span::current().record("profile_id", admin.profile_id.as_i32());
        Ok(Self(admin))
    }
}

/// Store the current admin in the session.
///
/// The session ID is cycled first so a pre-login ID cannot be fixated.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be reached.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use keystall_core::{AdminRole, Email, Permissions, ProfileId};

    use super::*;

    fn signed_in(role: AdminRole) -> RequireAdminAuth {
        RequireAdminAuth(AdminUser {
            profile_id: ProfileId::new(4),
            email: Email::parse("mod@keystall.test").unwrap(),
            display_name: "Mod".to_owned(),
            role,
            permissions: Permissions::default_for(role),
            created_at: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_moderator_forbidden_outside_grants() {
        let moderator = signed_in(AdminRole::Moderator);
        assert!(moderator.require(Resource::Orders, Action::Edit).is_ok());

        let response = moderator
            .require(Resource::Products, Action::Delete)
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "You do not have permission to do that");
    }

    #[test]
    fn test_admin_cannot_edit_admin_users_by_default() {
        let admin = signed_in(AdminRole::Admin);
        assert!(admin.require(Resource::AdminUsers, Action::View).is_ok());
        assert!(admin.require(Resource::AdminUsers, Action::Edit).is_err());
        assert!(signed_in(AdminRole::SuperAdmin)
            .require(Resource::AdminUsers, Action::Delete)
            .is_ok());
    }
}
