//! Order types for the verification queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystall_core::{
    AccountCredentials, DeliveredCredentials, DeliveryType, Email, Money, OrderId, OrderNumber,
    OrderStatus, ProductId, ProfileId, VariantId,
};

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 1000;

/// Row in the order queue.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_email: Email,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Everything an admin needs to verify an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub profile_id: ProfileId,
    pub customer_email: Email,
    pub customer_name: String,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub unit_price: Money,
    pub unit_cost: Option<Money>,
    pub total: Money,
    pub status: OrderStatus,
    pub has_payment_proof: bool,
    /// The customer's own account (manual activation).
    pub customer_credentials: Option<AccountCredentials>,
    pub delivered_credentials: Option<DeliveredCredentials>,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// `GET /api/orders` query.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// `POST /api/orders/{id}/reject` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectInput {
    pub reason: String,
}

/// One line of the orders CSV export.
#[derive(Debug, Clone)]
pub struct OrderExportRow {
    pub order_number: OrderNumber,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_email: String,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub total: Money,
    pub unit_cost: Option<Money>,
    /// When an admin approved or rejected the order.
    pub verified_at: Option<DateTime<Utc>>,
}
