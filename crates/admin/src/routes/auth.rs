//! Admin login and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use keystall_core::{AdminRole, Permissions};

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{AdminUser, CurrentAdmin};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// `POST /auth/login` body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The logged-in admin and what they may do.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub admin: CurrentAdmin,
    pub role: AdminRole,
    pub permissions: Permissions,
}

impl From<&AdminUser> for MeResponse {
    fn from(admin: &AdminUser) -> Self {
        Self {
            admin: CurrentAdmin::from(admin),
            role: admin.role,
            permissions: admin.permissions.clone(),
        }
    }
}

/// Log in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<MeResponse>> {
    let admin = match AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
    {
        Ok(admin) => admin,
        Err(e) => {
            tracing::info!(error = %e, "Admin login failed");
            return Err(e.into());
        }
    };

    set_current_admin(&session, &CurrentAdmin::from(&admin))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&admin.profile_id, Some(admin.email.as_str()));
    add_breadcrumb("auth", "Admin logged in", None);
    Ok(Json(MeResponse::from(&admin)))
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Who is logged in.
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<MeResponse> {
    Json(MeResponse::from(&admin))
}
