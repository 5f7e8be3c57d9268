//! Dashboard counters.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::DashboardStats;
use crate::state::AppState;

/// Order queue, revenue and stock at a glance. Any admin may see it.
#[instrument(skip(state, admin), fields(profile_id = %admin.profile_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Json<DashboardStats>> {
    let stats = DashboardRepository::new(state.pool()).stats().await?;
    Ok(Json(stats))
}
