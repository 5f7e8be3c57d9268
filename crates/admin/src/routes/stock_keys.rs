//! Stock key handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use keystall_core::{Action, ProductId, Resource, StockKeyId};

use crate::db::StockKeyRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdminAuth;
use crate::models::{ImportResult, StockCountRow, StockKey, StockKeyImport};
use crate::state::AppState;

/// `POST /api/stock-keys/expire` response.
#[derive(Debug, Serialize)]
pub struct ExpireResult {
    pub expired: u64,
}

/// Keys of one product, secrets masked.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<StockKey>>> {
    admin.require(Resource::StockKeys, Action::View)?;
    let keys = StockKeyRepository::new(state.pool()).list(product_id).await?;
    Ok(Json(keys))
}

/// Import newline-separated keys. Keys already stored for the product are
/// skipped.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn import(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(product_id): Path<ProductId>,
    Json(input): Json<StockKeyImport>,
) -> Result<Json<ImportResult>> {
    admin.require(Resource::StockKeys, Action::Edit)?;
    let batch = input.into_batch(Utc::now())?;

    let result = StockKeyRepository::new(state.pool())
        .bulk_import(product_id, &batch)
        .await
        .map_err(|e| AppError::from_repository(e, "Variant"))?;

    tracing::info!(
        product_id = %product_id,
        inserted = result.inserted,
        skipped = result.skipped,
        "Stock keys imported"
    );
    add_breadcrumb("stock_keys", "Stock keys imported", None);
    Ok(Json(result))
}

/// Revoke one key.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn revoke(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<StockKeyId>,
) -> Result<Json<StockKey>> {
    admin.require(Resource::StockKeys, Action::Delete)?;
    let key = StockKeyRepository::new(state.pool())
        .revoke(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Stock key"))?;

    tracing::info!(stock_key_id = %id, "Stock key revoked");
    Ok(Json(key))
}

/// Expire available keys past their expiry date.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn expire(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<ExpireResult>> {
    admin.require(Resource::StockKeys, Action::Edit)?;
    let expired = StockKeyRepository::new(state.pool()).expire_due().await?;
    tracing::info!(expired, "Expired stock keys");
    Ok(Json(ExpireResult { expired }))
}

/// Available keys per product and variant.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn counts(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<StockCountRow>>> {
    admin.require(Resource::StockKeys, Action::View)?;
    Ok(Json(StockKeyRepository::new(state.pool()).counts().await?))
}
