//! Order queue and verification handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use keystall_core::{Action, CredentialsForm, OrderId, OrderNumber, Resource};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdminAuth;
use crate::models::{OrderDetail, OrderFilter, OrderSummary, RejectInput};
use crate::services::{Approval, VerificationService};
use crate::state::AppState;

/// `POST /api/orders/{id}/reject` response.
#[derive(Debug, Serialize)]
pub struct Rejection {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
}

/// Orders filtered by status.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderSummary>>> {
    admin.require(Resource::Orders, Action::View)?;
    let orders = OrderRepository::new(state.pool()).list(filter.status).await?;
    Ok(Json(orders))
}

/// Full order, including what the customer submitted.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn show(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    admin.require(Resource::Orders, Action::View)?;
    let order = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;
    Ok(Json(order))
}

/// Stream the payment proof image. Never cached.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn payment_proof(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Orders, Action::View)?;
    let path = OrderRepository::new(state.pool())
        .payment_proof_path(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Order"))?
        .ok_or_else(|| AppError::NotFound("Payment proof".to_owned()))?;

    let file = state.media().get(&path).await?;
    Ok((
        [
            (CONTENT_TYPE, file.content_type),
            (CACHE_CONTROL, "private, no-store"),
        ],
        file.bytes,
    ))
}

/// Approve a submitted order and deliver its credentials.
#[instrument(skip(state, admin, form), fields(profile_id = %admin.0.profile_id))]
pub async fn approve(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<OrderId>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<Approval>> {
    admin.require(Resource::Orders, Action::Edit)?;
    let approval = VerificationService::new(state.pool(), state.config().loyalty_point_unit)
        .approve(id, admin.0.profile_id, &form)
        .await?;

    add_breadcrumb(
        "orders",
        "Order approved",
        Some(&[("order_number", approval.order_number.as_str())]),
    );
    Ok(Json(approval))
}

/// Reject a submitted order with a reason the customer will see.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn reject(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<RejectInput>,
) -> Result<Json<Rejection>> {
    admin.require(Resource::Orders, Action::Edit)?;
    let order_number = VerificationService::new(state.pool(), state.config().loyalty_point_unit)
        .reject(id, admin.0.profile_id, &input.reason)
        .await?;

    add_breadcrumb(
        "orders",
        "Order rejected",
        Some(&[("order_number", order_number.as_str())]),
    );
    Ok(Json(Rejection {
        order_id: id,
        order_number,
    }))
}
