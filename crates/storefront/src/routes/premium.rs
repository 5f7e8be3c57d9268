//! Members-only content handler.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::PremiumRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::PremiumContent;
use crate::state::AppState;

/// Published premium content; members only.
#[instrument(skip(state, customer), fields(profile_id = %customer.id))]
pub async fn content(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<PremiumContent>>> {
    let premium = PremiumRepository::new(state.pool());
    if !premium.is_member(customer.id, Utc::now()).await? {
        return Err(AppError::Forbidden(
            "Premium content is for members only".to_owned(),
        ));
    }
    Ok(Json(premium.published_content().await?))
}
