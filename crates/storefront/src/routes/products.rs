//! Catalog handlers.
//!
//! Prices are quoted for the viewer: members see premium prices, and
//! members-only products are hidden from everyone else.

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use keystall_core::ProfileId;

use crate::db::{CatalogRepository, PremiumRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{ProductCard, ProductDetail, VariantView};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Active products the viewer may see.
#[instrument(skip(state, customer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<ProductCard>>> {
    let now = Utc::now();
    let is_member = viewer_is_member(&state, customer.map(|c| c.id)).await?;
    let catalog = CatalogRepository::new(state.pool());

    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let products: Vec<_> = catalog
        .list_products(category)
        .await?
        .into_iter()
        .filter(|p| p.visible_to(is_member))
        .collect();

    let ids: Vec<_> = products.iter().map(|p| p.id).collect();
    let with_variants: HashSet<_> = catalog
        .variants_for(&ids)
        .await?
        .into_iter()
        .map(|v| v.product_id)
        .collect();
    let counts = catalog.stock_counts().await?;

    let cards = products
        .iter()
        .map(|p| {
            ProductCard::new(
                p,
                with_variants.contains(&p.id),
                &counts,
                state.media(),
                is_member,
                now,
            )
        })
        .collect();

    Ok(Json(cards))
}

/// Product detail with per-variant quotes and stock.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let now = Utc::now();
    let is_member = viewer_is_member(&state, customer.map(|c| c.id)).await?;
    let catalog = CatalogRepository::new(state.pool());

    let product = catalog
        .get_by_slug(&slug)
        .await?
        .filter(|p| p.visible_to(is_member))
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;

    let variants = catalog.variants_for(&[product.id]).await?;
    let counts = catalog.stock_counts().await?;

    let card = ProductCard::new(
        &product,
        !variants.is_empty(),
        &counts,
        state.media(),
        is_member,
        now,
    );
    let variants = variants
        .iter()
        .map(|v| VariantView::new(&product, v, &counts, is_member, now))
        .collect();

    Ok(Json(ProductDetail {
        card,
        description: product.description,
        variants,
    }))
}

async fn viewer_is_member(state: &AppState, profile_id: Option<ProfileId>) -> Result<bool> {
    match profile_id {
        Some(id) => Ok(PremiumRepository::new(state.pool())
            .is_member(id, Utc::now())
            .await?),
        None => Ok(false),
    }
}
