//! Admin account management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use keystall_core::{Action, ProfileId, Resource};

use crate::db::AdminUserRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdminAuth;
use crate::models::{AdminUser, NewAdminInput, PromoteInput, UpdateAdminInput};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// All admins.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<AdminUser>>> {
    admin.require(Resource::AdminUsers, Action::View)?;
    Ok(Json(AdminUserRepository::new(state.pool()).list().await?))
}

/// Create a new profile with admin access.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<NewAdminInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::AdminUsers, Action::Edit)?;
    let created = AdminAuthService::new(state.pool())
        .create_admin_as(&admin.0, &input)
        .await?;
    add_breadcrumb("admin_users", "Admin created", None);
    Ok((StatusCode::CREATED, Json(created)))
}

/// Give an existing customer admin access.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn promote(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<PromoteInput>,
) -> Result<Json<AdminUser>> {
    admin.require(Resource::AdminUsers, Action::Edit)?;
    let promoted = AdminAuthService::new(state.pool())
        .promote_as(&admin.0, &input)
        .await?;
    add_breadcrumb("admin_users", "Profile promoted", None);
    Ok(Json(promoted))
}

/// Change another admin's role and permissions.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(target): Path<ProfileId>,
    Json(input): Json<UpdateAdminInput>,
) -> Result<Json<AdminUser>> {
    admin.require(Resource::AdminUsers, Action::Edit)?;
    let updated = AdminAuthService::new(state.pool())
        .update(&admin.0, target, &input)
        .await?;
    Ok(Json(updated))
}

/// Revoke another admin's access.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn revoke(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(target): Path<ProfileId>,
) -> Result<StatusCode> {
    admin.require(Resource::AdminUsers, Action::Delete)?;
    AdminAuthService::new(state.pool())
        .revoke(&admin.0, target)
        .await?;
    add_breadcrumb("admin_users", "Admin revoked", None);
    Ok(StatusCode::NO_CONTENT)
}
