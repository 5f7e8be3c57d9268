//! Promotional banner handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use keystall_core::{Action, BannerId, Resource};

use crate::db::BannerRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::models::{ActiveToggle, Banner, BannerInput, BannerOrder};
use crate::state::AppState;

/// All banners in display order.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<Banner>>> {
    admin.require(Resource::Banners, Action::View)?;
    Ok(Json(BannerRepository::new(state.pool()).list().await?))
}

/// Add a banner at the end of the list.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<BannerInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Banners, Action::Edit)?;
    let input = input.validate()?;
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    tracing::info!(banner_id = %banner.id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// Replace a banner.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<BannerId>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>> {
    admin.require(Resource::Banners, Action::Edit)?;
    let input = input.validate()?;
    let banner = BannerRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| AppError::from_repository(e, "Banner"))?;
    Ok(Json(banner))
}

/// Show or hide a banner.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn set_active(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<BannerId>,
    Json(toggle): Json<ActiveToggle>,
) -> Result<Json<Banner>> {
    admin.require(Resource::Banners, Action::Edit)?;
    let banner = BannerRepository::new(state.pool())
        .set_active(id, toggle.is_active)
        .await
        .map_err(|e| AppError::from_repository(e, "Banner"))?;
    Ok(Json(banner))
}

/// Delete a banner.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<BannerId>,
) -> Result<StatusCode> {
    admin.require(Resource::Banners, Action::Delete)?;
    BannerRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Banner"))?;
    tracing::info!(banner_id = %id, "Banner deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Set the display order. Every banner must be listed exactly once.
#[instrument(skip(state, admin, order), fields(profile_id = %admin.0.profile_id))]
pub async fn reorder(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(order): Json<BannerOrder>,
) -> Result<Json<Vec<Banner>>> {
    admin.require(Resource::Banners, Action::Edit)?;
    let banners = BannerRepository::new(state.pool())
        .reorder(&order.ids)
        .await
        .map_err(|e| AppError::from_repository(e, "Banner"))?;
    Ok(Json(banners))
}
