//! Customer authentication handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, Profile};
use crate::services::AuthService;
use crate::state::AppState;

/// `POST /api/auth/register` body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// `POST /api/auth/login` body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and log in.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let profile = AuthService::new(state.pool())
        .register(&body.email, &body.password, body.display_name.as_deref())
        .await?;

    let customer = start_session(&session, &profile).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Log in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CurrentCustomer>> {
    let profile = match AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            tracing::info!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    let customer = start_session(&session, &profile).await?;
    Ok(Json(customer))
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

async fn start_session(session: &Session, profile: &Profile) -> Result<CurrentCustomer> {
    let customer = CurrentCustomer::from(profile);
    set_current_customer(session, &customer)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    add_breadcrumb("auth", "Customer logged in", None);
    tracing::info!(profile_id = %customer.id, "Customer logged in");
    Ok(customer)
}
