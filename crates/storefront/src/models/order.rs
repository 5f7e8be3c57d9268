//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keystall_core::{
    DeliveredCredentials, DeliveryType, Money, OrderId, OrderNumber, OrderStatus, ProductId,
    ProfileId, VariantId,
};

/// A customer's order (domain type).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub profile_id: ProfileId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub unit_price: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_proof_path: Option<String>,
    pub delivered_credentials: Option<DeliveredCredentials>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// What the customer sees when polling an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub unit_price: Money,
    pub total: Money,
    /// False while the proof upload still has to be retried.
    pub has_payment_proof: bool,
    pub rejection_reason: Option<String>,
    /// Present only once the order is completed.
    pub credentials: Option<DeliveredCredentials>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let credentials = if order.status == OrderStatus::Completed {
            order.delivered_credentials
        } else {
            None
        };
        Self {
            order_number: order.order_number,
            status: order.status,
            product_name: order.product_name,
            variant_name: order.variant_name,
            delivery_type: order.delivery_type,
            unit_price: order.unit_price,
            total: order.total,
            has_payment_proof: order.payment_proof_path.is_some(),
            rejection_reason: order.rejection_reason,
            credentials,
            created_at: order.created_at,
            submitted_at: order.submitted_at,
            completed_at: order.completed_at,
            cancelled_at: order.cancelled_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(1),
            order_number: OrderNumber::parse("KS-260510-7XK2QP").unwrap(),
            profile_id: ProfileId::new(3),
            product_id: ProductId::new(9),
            variant_id: None,
            product_name: "Office Suite".to_owned(),
            variant_name: None,
            delivery_type: DeliveryType::InstantKey,
            unit_price: "19.99".parse().unwrap(),
            total: "19.99".parse().unwrap(),
            status,
            payment_proof_path: Some("payment-proofs/KS-260510-7XK2QP/a.png".to_owned()),
            delivered_credentials: Some(DeliveredCredentials::LicenseKey {
                key: "ABCD-1234".to_owned(),
            }),
            rejection_reason: None,
            created_at: Utc::now(),
            submitted_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_credentials_hidden_until_completed() {
        for status in [OrderStatus::Pending, OrderStatus::Submitted, OrderStatus::Cancelled] {
            assert!(OrderView::from(order(status)).credentials.is_none());
        }
        let view = OrderView::from(order(OrderStatus::Completed));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["credentials"]["key"], "ABCD-1234");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["total"], "19.99");
    }
}
