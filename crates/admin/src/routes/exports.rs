//! CSV exports.

use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::instrument;

use keystall_core::{Action, Resource, StockCounts};

use crate::db::{OrderRepository, ProductRepository, StockKeyRepository};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::{orders_csv, products_csv};
use crate::state::AppState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Every order as CSV.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn orders(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Orders, Action::View)?;
    let rows = OrderRepository::new(state.pool()).export_rows().await?;
    let body = orders_csv(&rows)?;
    tracing::info!(rows = rows.len(), "Orders exported");
    Ok(attachment("orders", body))
}

/// Every product with its stock as CSV.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn products(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Products, Action::View)?;
    let products = ProductRepository::new(state.pool()).list().await?;
    let counts = StockKeyRepository::new(state.pool()).counts().await?;
    let counts = StockCounts::from_rows(
        counts
            .into_iter()
            .map(|row| (row.product_id, row.variant_id, row.available)),
    );
    let body = products_csv(&products, &counts)?;
    tracing::info!(rows = products.len(), "Products exported");
    Ok(attachment("products", body))
}

fn attachment(name: &str, body: Vec<u8>) -> impl IntoResponse {
    let disposition = format!(
        "attachment; filename=\"{name}-{}.csv\"",
        Utc::now().format("%Y%m%d")
    );
    (
        [
            (CONTENT_TYPE, CSV_CONTENT_TYPE.to_owned()),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, "no-store".to_owned()),
        ],
        body,
    )
}
