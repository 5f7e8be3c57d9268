//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as JSON so the
//! back-office UI can show them in a toast:
//!
//! ```json
//! { "error": "product is out of stock" }
//! ```
//!
//! Validation failures (422) add a `fields` map. Server errors are captured
//! to Sentry and answered with a generic message.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keystall_core::ValidationErrors;
use keystall_media::MediaError;
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AdminAuthError, ExportError, VerificationError};

/// Application-level error type for admin.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Admin authentication or access management failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Approving or rejecting an order failed.
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    /// Object storage failed or an upload was rejected.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Writing an export failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// One or more request fields are invalid.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, String>>,
}

impl AppError {
    /// Map a repository error, turning `NotFound` and `Conflict` into client
    /// errors about `what`.
    pub fn from_repository(err: RepositoryError, what: &str) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(what.to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }

    /// Server-side failures that are reported and hidden from clients.
    fn is_internal(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Export(_) | Self::Internal(_) => true,
            Self::Media(err) => !err.is_client_error() && !matches!(err, MediaError::NotFound),
            Self::Auth(err) => err.is_internal(),
            Self::Verification(err) => err.is_internal(),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_internal() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AdminAuthError::EmailTaken
                | AdminAuthError::LastSuperAdmin
                | AdminAuthError::SelfChange => StatusCode::CONFLICT,
                AdminAuthError::ProfileNotFound | AdminAuthError::AdminNotFound => {
                    StatusCode::NOT_FOUND
                }
                AdminAuthError::SuperAdminOnly | AdminAuthError::ExceedsOwnAccess { .. } => {
                    StatusCode::FORBIDDEN
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Verification(err) => match err {
                VerificationError::OrderNotFound => StatusCode::NOT_FOUND,
                VerificationError::NotSubmitted(_) | VerificationError::OutOfStock => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Database(RepositoryError::NotFound)
            | Self::Media(MediaError::NotFound)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Media(MediaError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Media(_) | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Export(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        if self.is_internal() {
            // Don't expose internal error details to clients
            return ErrorBody {
                error: "Internal server error".to_string(),
                fields: None,
            };
        }
        let fields = match self {
            Self::Validation(errors) => Some(errors.to_map()),
            Self::Auth(err) => err.field_errors().map(|e| e.to_map()),
            Self::Verification(err) => err.field_errors().map(|e| e.to_map()),
            Self::Media(err) if err.is_client_error() => {
                Some(ValidationErrors::single("image", err.to_string()).to_map())
            }
            _ => None,
        };
        let error = match self {
            Self::Auth(err) => err.to_string(),
            Self::Verification(err) => err.to_string(),
            Self::Media(err) => err.to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Database(_) | Self::Export(_) => "Internal server error".to_string(),
        };
        ErrorBody { error, fields }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_internal() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the logged-in admin.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for admin actions.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use keystall_core::{Action, OrderStatus, Resource};

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        fn status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::Conflict("slug already exists".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Verification(VerificationError::OutOfStock)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Verification(VerificationError::NotSubmitted(
                OrderStatus::Cancelled
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Auth(AdminAuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AppError::Auth(AdminAuthError::SuperAdminOnly)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AppError::Media(MediaError::TooLarge { max_bytes: 10 })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_verification_errors_render_for_toast() {
        let response = AppError::Verification(VerificationError::OutOfStock).into_response();
        let json = body_json(response).await;
        assert_eq!(json["error"], "product is out of stock");
        assert!(json.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_grant_refusal_names_the_permission() {
        let err = AppError::Auth(AdminAuthError::ExceedsOwnAccess {
            resource: Resource::Products,
            action: Action::Delete,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "you cannot grant delete on products without holding it"
        );
    }

    #[tokio::test]
    async fn test_conflict_message_passed_through() {
        let err = AppError::from_repository(
            RepositoryError::Conflict("product has orders; deactivate it instead".into()),
            "Product",
        );
        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "product has orders; deactivate it instead");

        let err = AppError::from_repository(RepositoryError::NotFound, "Product");
        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "Product not found");
    }
}
