//! Checkout and order handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use keystall_core::{OrderNumber, ProductId, ValidationErrors, VariantId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CurrentCustomer, OrderView};
use crate::services::{AccountInput, CheckoutRequest, CheckoutService};
use crate::state::AppState;

/// Multipart field holding the proof image.
const PAYMENT_PROOF_FIELD: &str = "payment_proof";

/// Place an order with its payment proof.
///
/// Multipart fields: `product_id`, `variant_id`, `client_token`,
/// `account_identifier`, `account_password`, `account_note`,
/// `payment_proof`.
#[instrument(skip(state, session, customer, multipart), fields(profile_id = %customer.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let request = read_checkout_form(multipart).await?;
    add_breadcrumb("checkout", "Checkout submitted", None);

    let order = checkout_service(&state)
        .place_order(&limiter_key(&session, &customer), customer.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// The customer's orders, newest first.
#[instrument(skip(state, customer), fields(profile_id = %customer.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// Poll one order.
#[instrument(skip(state, customer), fields(profile_id = %customer.id))]
pub async fn show_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<OrderView>> {
    let number = parse_order_number(&number)?;
    let order = OrderRepository::new(state.pool())
        .get_for_customer(customer.id, &number)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;
    Ok(Json(order.into()))
}

/// Retry the proof upload for an order still `pending`.
#[instrument(skip(state, session, customer, multipart), fields(profile_id = %customer.id))]
pub async fn retry_payment_proof(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(number): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<OrderView>> {
    let number = parse_order_number(&number)?;

    let mut proof = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some(PAYMENT_PROOF_FIELD) {
            proof = Some(field.bytes().await.map_err(bad_multipart)?);
        }
    }
    let proof = proof.ok_or_else(missing_proof)?;

    let order = checkout_service(&state)
        .retry_payment_proof(
            &limiter_key(&session, &customer),
            customer.id,
            &number,
            proof,
        )
        .await?;
    Ok(Json(order.into()))
}

fn checkout_service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(
        state.pool(),
        state.media(),
        state.checkout_limiter(),
        state.config().checkout.proof_max_bytes,
    )
}

/// Browser session ID, or the customer when the session has no ID yet.
fn limiter_key(session: &Session, customer: &CurrentCustomer) -> String {
    session.id().map_or_else(
        || format!("profile:{}", customer.id),
        |id| format!("session:{id}"),
    )
}

fn parse_order_number(raw: &str) -> Result<OrderNumber> {
    OrderNumber::parse(raw).map_err(|_| AppError::NotFound("Order".to_owned()))
}

async fn read_checkout_form(mut multipart: Multipart) -> Result<CheckoutRequest> {
    let mut errors = ValidationErrors::new();
    let mut product_id = None;
    let mut variant_id = None;
    let mut client_token = None;
    let mut account = AccountInput::default();
    let mut has_account = false;
    let mut proof: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == PAYMENT_PROOF_FIELD {
            proof = Some(field.bytes().await.map_err(bad_multipart)?);
            continue;
        }

        let raw = field.text().await.map_err(bad_multipart)?;
        let value = raw.trim();
        match name.as_str() {
            "product_id" => match value.parse::<ProductId>() {
                Ok(id) => product_id = Some(id),
                Err(_) => errors.push("product_id", "must be a product ID"),
            },
            "variant_id" if !value.is_empty() => match value.parse::<VariantId>() {
                Ok(id) => variant_id = Some(id),
                Err(_) => errors.push("variant_id", "must be a variant ID"),
            },
            "client_token" if !value.is_empty() => match Uuid::parse_str(value) {
                Ok(token) => client_token = Some(token),
                Err(_) => errors.push("client_token", "must be a UUID"),
            },
            "account_identifier" => {
                account.identifier = value.to_owned();
                has_account = true;
            }
            "account_password" => {
                // Passwords are taken verbatim
                account.password = raw.clone();
                has_account = true;
            }
            "account_note" => {
                account.note = Some(value.to_owned()).filter(|n| !n.is_empty());
                has_account = true;
            }
            _ => {}
        }
    }

    if product_id.is_none() && errors.iter().all(|e| e.field != "product_id") {
        errors.push("product_id", "is required");
    }
    if proof.is_none() {
        errors.push(PAYMENT_PROOF_FIELD, "is required");
    }
    errors.into_result()?;

    match (product_id, proof) {
        (Some(product_id), Some(payment_proof)) => Ok(CheckoutRequest {
            product_id,
            variant_id,
            client_token,
            account: has_account.then_some(account),
            payment_proof,
        }),
        _ => Err(missing_proof()),
    }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("malformed upload: {}", err.body_text()))
}

fn missing_proof() -> AppError {
    AppError::Validation(ValidationErrors::single(PAYMENT_PROOF_FIELD, "is required"))
}
