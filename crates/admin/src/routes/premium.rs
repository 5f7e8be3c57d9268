//! Premium memberships, product rules and members-only content.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::instrument;

use keystall_core::{Action, MembershipId, PremiumContentId, ProductId, Resource};

use crate::db::PremiumRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::models::{
    GrantMembershipInput, Membership, PremiumContent, PremiumContentInput, PremiumProduct,
    PremiumRuleInput,
};
use crate::state::AppState;

/// All memberships, newest first.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn memberships(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<Membership>>> {
    admin.require(Resource::Premium, Action::View)?;
    Ok(Json(
        PremiumRepository::new(state.pool())
            .list_memberships()
            .await?,
    ))
}

/// Grant a membership to a registered customer.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn grant_membership(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<GrantMembershipInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Premium, Action::Edit)?;
    let email = input.validate(Utc::now())?;
    let membership = PremiumRepository::new(state.pool())
        .grant_membership(&email, input.expires_at, admin.0.profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_owned()))?;

    tracing::info!(
        membership_id = %membership.id,
        member = %membership.profile_id,
        "Membership granted"
    );
    Ok((StatusCode::CREATED, Json(membership)))
}

/// End a membership now.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn revoke_membership(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<MembershipId>,
) -> Result<StatusCode> {
    admin.require(Resource::Premium, Action::Delete)?;
    PremiumRepository::new(state.pool())
        .revoke_membership(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Membership"))?;
    tracing::info!(membership_id = %id, "Membership revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// Products with a premium rule.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn products(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<PremiumProduct>>> {
    admin.require(Resource::Premium, Action::View)?;
    Ok(Json(PremiumRepository::new(state.pool()).list_products().await?))
}

/// Create or replace a product's premium rule.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn set_product_rule(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(product_id): Path<ProductId>,
    Json(input): Json<PremiumRuleInput>,
) -> Result<StatusCode> {
    admin.require(Resource::Premium, Action::Edit)?;
    let rule = input.validate()?;
    PremiumRepository::new(state.pool())
        .set_product_rule(product_id, rule)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;
    tracing::info!(product_id = %product_id, access = ?rule.access, "Premium rule set");
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a product's premium rule.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn remove_product_rule(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    admin.require(Resource::Premium, Action::Delete)?;
    PremiumRepository::new(state.pool())
        .remove_product_rule(product_id)
        .await
        .map_err(|e| AppError::from_repository(e, "Premium rule"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// All premium content, drafts included.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn content(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<PremiumContent>>> {
    admin.require(Resource::Premium, Action::View)?;
    Ok(Json(PremiumRepository::new(state.pool()).list_content().await?))
}

/// Create premium content.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn create_content(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<PremiumContentInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Premium, Action::Edit)?;
    let input = input.validate()?;
    let content = PremiumRepository::new(state.pool())
        .create_content(&input)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// Replace premium content.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn update_content(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<PremiumContentId>,
    Json(input): Json<PremiumContentInput>,
) -> Result<Json<PremiumContent>> {
    admin.require(Resource::Premium, Action::Edit)?;
    let input = input.validate()?;
    let content = PremiumRepository::new(state.pool())
        .update_content(id, &input)
        .await
        .map_err(|e| AppError::from_repository(e, "Premium content"))?;
    Ok(Json(content))
}

/// Delete premium content.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn delete_content(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<PremiumContentId>,
) -> Result<StatusCode> {
    admin.require(Resource::Premium, Action::Delete)?;
    PremiumRepository::new(state.pool())
        .delete_content(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Premium content"))?;
    Ok(StatusCode::NO_CONTENT)
}
