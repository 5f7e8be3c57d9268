//! Order queue and verification writes.
//!
//! Reads go through [`OrderRepository`]. The verification steps take a
//! connection so the service can run them inside one transaction; each
//! status write is guarded by the expected prior status.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use keystall_core::{
    AccountCredentials, DeliveredCredentials, DeliveryType, Email, Money, OrderId, OrderNumber,
    OrderStatus, ProductId, ProfileId, StockKeyId, VariantId,
};

use super::RepositoryError;
use crate::models::{OrderDetail, OrderExportRow, OrderSummary};

/// Most rows the queue returns at once.
const QUEUE_LIMIT: i64 = 500;

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    order_number: OrderNumber,
    customer_email: Email,
    product_name: String,
    variant_name: Option<String>,
    delivery_type: DeliveryType,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            customer_email: row.customer_email,
            product_name: row.product_name,
            variant_name: row.variant_name,
            delivery_type: row.delivery_type,
            total: row.total,
            status: row.status,
            created_at: row.created_at,
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderDetailRow {
    id: OrderId,
    order_number: OrderNumber,
    profile_id: ProfileId,
    customer_email: Email,
    customer_name: String,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    product_name: String,
    variant_name: Option<String>,
    delivery_type: DeliveryType,
    unit_price: Money,
    unit_cost: Option<Money>,
    total: Money,
    status: OrderStatus,
    payment_proof_path: Option<String>,
    customer_credentials: Option<Json<AccountCredentials>>,
    delivered_credentials: Option<Json<DeliveredCredentials>>,
    rejection_reason: Option<String>,
    verified_by: Option<ProfileId>,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            profile_id: row.profile_id,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            delivery_type: row.delivery_type,
            unit_price: row.unit_price,
            unit_cost: row.unit_cost,
            total: row.total,
            status: row.status,
            has_payment_proof: row.payment_proof_path.is_some(),
            customer_credentials: row.customer_credentials.map(|Json(c)| c),
            delivered_credentials: row.delivered_credentials.map(|Json(c)| c),
            rejection_reason: row.rejection_reason,
            verified_by: row.verified_by,
            created_at: row.created_at,
            submitted_at: row.submitted_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderExportDbRow {
    order_number: OrderNumber,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    customer_email: String,
    product_name: String,
    variant_name: Option<String>,
    delivery_type: DeliveryType,
    total: Money,
    unit_cost: Option<Money>,
    verified_at: Option<DateTime<Utc>>,
}

impl From<OrderExportDbRow> for OrderExportRow {
    fn from(row: OrderExportDbRow) -> Self {
        Self {
            order_number: row.order_number,
            created_at: row.created_at,
            status: row.status,
            customer_email: row.customer_email,
            product_name: row.product_name,
            variant_name: row.variant_name,
            delivery_type: row.delivery_type,
            total: row.total,
            unit_cost: row.unit_cost,
            verified_at: row.verified_at,
        }
    }
}

/// Repository for reading orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders in a status (all when `None`). Submitted orders come oldest
    /// first so the queue is worked in arrival order; everything else
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.order_number, p.email AS customer_email, o.product_name,
                   o.variant_name, o.delivery_type, o.total, o.status, o.created_at,
                   o.submitted_at
            FROM shop.orders o
            JOIN shop.profiles p ON p.id = o.profile_id
            WHERE $1::order_status IS NULL OR o.status = $1
            ORDER BY
                CASE WHEN o.status = 'submitted' THEN o.submitted_at END ASC,
                o.created_at DESC
            LIMIT $2
            ",
        )
        .bind(status)
        .bind(QUEUE_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Full order with customer details and credentials.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderDetailRow>(
            r"
            SELECT o.id, o.order_number, o.profile_id, p.email AS customer_email,
                   p.display_name AS customer_name, o.product_id, o.variant_id,
                   o.product_name, o.variant_name, o.delivery_type, o.unit_price,
                   o.unit_cost, o.total, o.status, o.payment_proof_path,
                   o.customer_credentials, o.delivered_credentials,
                   o.rejection_reason, o.verified_by, o.created_at, o.submitted_at,
                   o.completed_at, o.cancelled_at
            FROM shop.orders o
            JOIN shop.profiles p ON p.id = o.profile_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(OrderDetail::from))
    }

    /// Object path of the order's payment proof.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn payment_proof_path(&self, id: OrderId) -> Result<Option<String>, RepositoryError> {
        let path: Option<Option<String>> =
            sqlx::query_scalar("SELECT payment_proof_path FROM shop.orders WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        path.ok_or(RepositoryError::NotFound)
    }

    /// Every order, oldest first, for the CSV export.
    ///
    /// An order is verified when it is approved or when a submitted order is
    /// rejected; cancelling a pending order is not a verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn export_rows(&self) -> Result<Vec<OrderExportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderExportDbRow>(
            r"
            SELECT o.order_number, o.created_at, o.status, p.email AS customer_email,
                   o.product_name, o.variant_name, o.delivery_type, o.total,
                   o.unit_cost,
                   COALESCE(
                       o.completed_at,
                       CASE WHEN o.submitted_at IS NOT NULL THEN o.cancelled_at END
                   ) AS verified_at
            FROM shop.orders o
            JOIN shop.profiles p ON p.id = o.profile_id
            ORDER BY o.created_at, o.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderExportRow::from).collect())
    }
}

/// The parts of an order that approval needs, read under a row lock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub profile_id: ProfileId,
    pub product_id: ProductId,
    pub delivery_type: DeliveryType,
    pub total: Money,
    pub status: OrderStatus,
    pub uses_stock_keys: bool,
    pub manual_stock: Option<i32>,
}

/// Lock an order row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<LockedOrder>, RepositoryError> {
    let order = sqlx::query_as::<_, LockedOrder>(
        r"
        SELECT o.id, o.order_number, o.profile_id, o.product_id, o.delivery_type,
               o.total, o.status, pr.uses_stock_keys, pr.manual_stock
        FROM shop.orders o
        JOIN shop.products pr ON pr.id = o.product_id
        WHERE o.id = $1
        FOR UPDATE OF o
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Bind an available stock key to the order.
///
/// Returns `None` when the product has no key left.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the procedure fails.
pub async fn assign_stock_key(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Option<(StockKeyId, String)>, RepositoryError> {
    let assigned: Option<(StockKeyId, String)> = sqlx::query_as(
        "SELECT assigned_key_id, assigned_secret FROM shop.assign_stock_key_to_order($1)",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(assigned)
}

/// Take one unit of manual stock.
///
/// Returns `false` when stock is at zero. Products with unlimited stock
/// (`NULL`) always succeed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn take_manual_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.products
        SET manual_stock = manual_stock - 1
        WHERE id = $1 AND (manual_stock IS NULL OR manual_stock > 0)
        ",
    )
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Move a submitted order to completed with its credentials.
///
/// Returns `false` if the order was not `submitted`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn complete_order(
    conn: &mut PgConnection,
    id: OrderId,
    credentials: &DeliveredCredentials,
    verified_by: ProfileId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.orders
        SET status = 'completed', delivered_credentials = $2, verified_by = $3,
            completed_at = now()
        WHERE id = $1 AND status = 'submitted'
        ",
    )
    .bind(id)
    .bind(Json(credentials))
    .bind(verified_by)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Move a submitted order to cancelled with a reason.
///
/// Returns `false` if the order was not `submitted`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cancel_order(
    conn: &mut PgConnection,
    id: OrderId,
    reason: &str,
    verified_by: ProfileId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.orders
        SET status = 'cancelled', rejection_reason = $2, verified_by = $3,
            cancelled_at = now()
        WHERE id = $1 AND status = 'submitted'
        ",
    )
    .bind(id)
    .bind(reason)
    .bind(verified_by)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Add loyalty points to a profile.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn award_loyalty_points(
    conn: &mut PgConnection,
    profile_id: ProfileId,
    points: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.profiles
        SET loyalty_points = LEAST(loyalty_points::bigint + $2, 2147483647)::integer
        WHERE id = $1
        ",
    )
    .bind(profile_id)
    .bind(i64::from(points))
    .execute(&mut *conn)
    .await?;

    Ok(())
}
