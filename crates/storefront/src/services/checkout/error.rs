//! Checkout error types.

use std::time::Duration;

use keystall_core::{CredentialsError, OrderStatus, ValidationErrors};
use keystall_media::MediaError;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while placing an order or submitting its proof.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Too many submissions from this session.
    #[error("too many checkout attempts, please wait before trying again")]
    RateLimited { retry_after: Duration },

    /// Product is unknown, inactive or hidden from the customer.
    #[error("product not found")]
    ProductNotFound,

    /// Order is unknown or belongs to someone else.
    #[error("order not found")]
    OrderNotFound,

    /// The product has variants and none (or a foreign one) was chosen.
    #[error("{0}")]
    InvalidVariant(String),

    /// Nothing left to sell.
    #[error("this product is out of stock")]
    OutOfStock,

    /// A proof can only be attached to a pending order.
    #[error("order is already {0}")]
    NotPending(OrderStatus),

    /// The request is missing fields or has malformed ones.
    #[error("invalid checkout request")]
    Invalid(ValidationErrors),

    /// Manual-activation account details are missing or invalid.
    #[error("account details are required for this product")]
    Credentials(#[from] CredentialsError),

    /// The payment proof image was rejected.
    #[error("{0}")]
    PaymentProof(MediaError),

    /// Uploading the proof failed.
    #[error("storage error: {0}")]
    Storage(MediaError),

    /// Could not find a free order number.
    #[error("could not allocate an order number")]
    OrderNumberExhausted,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Failures of ours rather than of the submitted form.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::OrderNumberExhausted | Self::Repository(_)
        )
    }

    /// Per-field messages for 422 responses.
    #[must_use]
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::Invalid(errors) | Self::Credentials(CredentialsError::Invalid(errors)) => {
                Some(errors.clone())
            }
            Self::InvalidVariant(msg) => Some(ValidationErrors::single("variant_id", msg.clone())),
            Self::PaymentProof(err) => {
                Some(ValidationErrors::single("payment_proof", err.to_string()))
            }
            _ => None,
        }
    }
}

impl From<MediaError> for CheckoutError {
    fn from(err: MediaError) -> Self {
        if err.is_client_error() {
            Self::PaymentProof(err)
        } else {
            Self::Storage(err)
        }
    }
}
