//! Banner handler.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::db::BannerRepository;
use crate::error::Result;
use crate::models::Banner;
use crate::state::AppState;

/// Banners inside their display window, in sort order.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    let banners = BannerRepository::new(state.pool()).live(Utc::now()).await?;
    Ok(Json(banners))
}
