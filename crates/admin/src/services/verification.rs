//! Order verification: approving or rejecting submitted orders.
//!
//! Both run in a single transaction that starts by locking the order row.
//! Any error drops the transaction, so the order stays `submitted` and no
//! stock or loyalty points move.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use keystall_core::{
    CredentialsError, CredentialsForm, DeliveredCredentials, DeliveryPlan, OrderId, OrderNumber,
    OrderStatus, ProfileId, StockKeyId, ValidationErrors,
};

use crate::db::RepositoryError;
use crate::db::orders::{
    assign_stock_key, award_loyalty_points, cancel_order, complete_order, lock_order,
    take_manual_stock,
};
use crate::models::order::MAX_REJECTION_REASON_LENGTH;

/// Errors from approving or rejecting an order.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No order with the ID.
    #[error("order not found")]
    OrderNotFound,

    /// Only submitted orders can be verified.
    #[error("order is {0}, only submitted orders can be verified")]
    NotSubmitted(OrderStatus),

    /// No stock key or manual stock left.
    #[error("product is out of stock")]
    OutOfStock,

    /// The approval form does not fit the delivery type.
    #[error("invalid delivery details")]
    Credentials(#[from] CredentialsError),

    /// Other invalid input, such as a missing rejection reason.
    #[error("invalid input")]
    Invalid(ValidationErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for VerificationError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl VerificationError {
    /// Server-side failures that are reported and hidden from clients.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_))
    }

    /// Field errors for 422 responses.
    #[must_use]
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::Credentials(CredentialsError::Invalid(errors)) | Self::Invalid(errors) => {
                Some(errors.clone())
            }
            _ => None,
        }
    }
}

/// What an approval did.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub credentials: DeliveredCredentials,
    /// Stock key bound to the order, for keyed products.
    pub stock_key_id: Option<StockKeyId>,
    pub loyalty_points: i32,
}

/// Approves and rejects submitted orders.
pub struct VerificationService<'a> {
    pool: &'a PgPool,
    loyalty_point_unit: u32,
}

impl<'a> VerificationService<'a> {
    /// Create a verification service awarding one loyalty point per
    /// `loyalty_point_unit` of order total.
    #[must_use]
    pub const fn new(pool: &'a PgPool, loyalty_point_unit: u32) -> Self {
        Self {
            pool,
            loyalty_point_unit,
        }
    }

    /// Approve a submitted order and deliver credentials.
    ///
    /// Keyed products always take a stock key; an instant-key order whose
    /// form leaves the key empty delivers that key's secret. Other products
    /// take one unit of manual stock.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::NotSubmitted` for orders in any other
    /// status, `VerificationError::Credentials` when the form does not fit
    /// the delivery type and `VerificationError::OutOfStock` when no stock
    /// is left.
    #[instrument(skip(self, form), fields(order_id = %order_id, admin = %admin))]
    pub async fn approve(
        &self,
        order_id: OrderId,
        admin: ProfileId,
        form: &CredentialsForm,
    ) -> Result<Approval, VerificationError> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id)
            .await?
            .ok_or(VerificationError::OrderNotFound)?;
        if order.status != OrderStatus::Submitted {
            return Err(VerificationError::NotSubmitted(order.status));
        }

        let plan = form.plan(order.delivery_type)?;

        let (assigned, stock_key_id) = if order.uses_stock_keys {
            let (key_id, secret) = assign_stock_key(&mut tx, order.id)
                .await?
                .ok_or(VerificationError::OutOfStock)?;
            (Some(secret), Some(key_id))
        } else {
            if plan == DeliveryPlan::FromStock {
                return Err(missing_license_key());
            }
            if !take_manual_stock(&mut tx, order.product_id).await? {
                return Err(VerificationError::OutOfStock);
            }
            (None, None)
        };

        let credentials = deliver(plan, assigned)?;

        if !complete_order(&mut tx, order.id, &credentials, admin).await? {
            return Err(VerificationError::NotSubmitted(order.status));
        }

        let loyalty_points = order.total.whole_units_of(self.loyalty_point_unit);
        if loyalty_points > 0 {
            award_loyalty_points(&mut tx, order.profile_id, loyalty_points).await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            delivery_type = %order.delivery_type,
            loyalty_points,
            "Order approved"
        );

        Ok(Approval {
            order_id: order.id,
            order_number: order.order_number,
            credentials,
            stock_key_id,
            loyalty_points,
        })
    }

    /// Reject a submitted order with a reason shown to the customer.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::Invalid` for an empty or overlong reason
    /// and `VerificationError::NotSubmitted` for orders in any other status.
    #[instrument(skip(self, reason), fields(order_id = %order_id, admin = %admin))]
    pub async fn reject(
        &self,
        order_id: OrderId,
        admin: ProfileId,
        reason: &str,
    ) -> Result<OrderNumber, VerificationError> {
        let reason = validate_reason(reason)?;

        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id)
            .await?
            .ok_or(VerificationError::OrderNotFound)?;
        if order.status != OrderStatus::Submitted {
            return Err(VerificationError::NotSubmitted(order.status));
        }

        if !cancel_order(&mut tx, order.id, reason, admin).await? {
            return Err(VerificationError::NotSubmitted(order.status));
        }

        tx.commit().await?;

        tracing::info!(order_number = %order.order_number, "Order rejected");
        Ok(order.order_number)
    }
}

fn missing_license_key() -> VerificationError {
    VerificationError::Invalid(ValidationErrors::single(
        "license_key",
        "is required for products without stock keys",
    ))
}

/// Credentials to write, given the plan and the secret of an assigned key.
fn deliver(
    plan: DeliveryPlan,
    assigned_secret: Option<String>,
) -> Result<DeliveredCredentials, VerificationError> {
    match plan {
        DeliveryPlan::Ready(credentials) => Ok(credentials),
        DeliveryPlan::FromStock => assigned_secret
            .map(|key| DeliveredCredentials::LicenseKey { key })
            .ok_or_else(missing_license_key),
    }
}

fn validate_reason(reason: &str) -> Result<&str, VerificationError> {
    let reason = reason.trim();
    let mut errors = ValidationErrors::new();
    errors.require("reason", reason);
    errors.max_len("reason", reason, MAX_REJECTION_REASON_LENGTH);
    errors.into_result().map_err(VerificationError::Invalid)?;
    Ok(reason)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keystall_core::DeliveryType;

    use super::*;

    #[test]
    fn test_deliver_uses_typed_credentials() {
        let plan = DeliveryPlan::Ready(DeliveredCredentials::LicenseKey {
            key: "TYPED-KEY".to_owned(),
        });
        let delivered = deliver(plan, Some("STOCK-KEY".to_owned())).unwrap();
        assert_eq!(
            delivered,
            DeliveredCredentials::LicenseKey {
                key: "TYPED-KEY".to_owned()
            }
        );
    }

    #[test]
    fn test_deliver_from_stock_takes_assigned_secret() {
        let delivered = deliver(DeliveryPlan::FromStock, Some("STOCK-KEY".to_owned())).unwrap();
        assert_eq!(
            delivered,
            DeliveredCredentials::LicenseKey {
                key: "STOCK-KEY".to_owned()
            }
        );

        let err = deliver(DeliveryPlan::FromStock, None).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["license_key"]);
    }

    #[test]
    fn test_form_mismatch_is_a_field_error() {
        let form = CredentialsForm {
            code: Some("SAVE-20".to_owned()),
            ..Default::default()
        };
        let err = VerificationError::from(form.plan(DeliveryType::Credentials).unwrap_err());
        assert!(!err.is_internal());
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["username", "password"]);
    }

    #[test]
    fn test_reason_required() {
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"x".repeat(MAX_REJECTION_REASON_LENGTH + 1)).is_err());
        assert_eq!(
            validate_reason("  Transfer amount does not match  ").unwrap(),
            "Transfer amount does not match"
        );
    }

    #[test]
    fn test_not_submitted_message() {
        let err = VerificationError::NotSubmitted(OrderStatus::Completed);
        assert_eq!(
            err.to_string(),
            "order is completed, only submitted orders can be verified"
        );
    }
}
