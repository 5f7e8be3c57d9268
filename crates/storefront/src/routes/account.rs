//! Account overview handler.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::{PremiumRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::AccountView;
use crate::state::AppState;

/// Profile, loyalty points and membership of the logged-in customer.
#[instrument(skip(state, customer), fields(profile_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<AccountView>> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_id(customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_owned()))?;

    let membership = PremiumRepository::new(state.pool())
        .active_membership(customer.id, Utc::now())
        .await?;

    Ok(Json(AccountView {
        id: profile.id,
        email: profile.email,
        display_name: profile.display_name,
        loyalty_points: profile.loyalty_points,
        member_since: profile.created_at,
        membership,
    }))
}
