//! Customer order repository.
//!
//! Every read is scoped to the owning profile; customers address orders by
//! their public [`OrderNumber`], never by ID.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use keystall_core::{
    AccountCredentials, DeliveredCredentials, DeliveryType, Money, OrderId, OrderNumber,
    OrderStatus, ProductId, ProfileId, VariantId,
};

use super::RepositoryError;
use crate::models::Order;

/// Unique constraint on the public order number.
pub const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

/// Unique constraint on `(profile_id, client_token)`.
pub const CLIENT_TOKEN_CONSTRAINT: &str = "orders_profile_id_client_token_key";

const ORDER_COLUMNS: &str = r"
    id, order_number, profile_id, product_id, variant_id, product_name,
    variant_name, delivery_type, unit_price, total, status, payment_proof_path,
    delivered_credentials, rejection_reason, created_at, submitted_at,
    completed_at, cancelled_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: OrderNumber,
    profile_id: ProfileId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    product_name: String,
    variant_name: Option<String>,
    delivery_type: DeliveryType,
    unit_price: Money,
    total: Money,
    status: OrderStatus,
    payment_proof_path: Option<String>,
    delivered_credentials: Option<Json<DeliveredCredentials>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            profile_id: row.profile_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            delivery_type: row.delivery_type,
            unit_price: row.unit_price,
            total: row.total,
            status: row.status,
            payment_proof_path: row.payment_proof_path,
            delivered_credentials: row.delivered_credentials.map(|Json(c)| c),
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            submitted_at: row.submitted_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
        }
    }
}

/// Values snapshotted into a new order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub order_number: &'a OrderNumber,
    pub profile_id: ProfileId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: &'a str,
    pub variant_name: Option<&'a str>,
    pub delivery_type: DeliveryType,
    pub unit_price: Money,
    pub unit_cost: Option<Money>,
    pub total: Money,
    pub customer_credentials: Option<&'a AccountCredentials>,
    pub client_token: Option<Uuid>,
}

/// Repository for a customer's own orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` carrying the constraint name when
    /// the order number or client token is already taken.
    pub async fn create(&self, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.orders (
                order_number, profile_id, product_id, variant_id, product_name,
                variant_name, delivery_type, unit_price, unit_cost, total,
                customer_credentials, client_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.order_number)
            .bind(order.profile_id)
            .bind(order.product_id)
            .bind(order.variant_id)
            .bind(order.product_name)
            .bind(order.variant_name)
            .bind(order.delivery_type)
            .bind(order.unit_price)
            .bind(order.unit_cost)
            .bind(order.total)
            .bind(order.customer_credentials.map(Json))
            .bind(order.client_token)
            .fetch_one(self.pool)
            .await
            .map_err(|e| match RepositoryError::unique_constraint(&e) {
                Some(constraint) => RepositoryError::Conflict(constraint.to_owned()),
                None => RepositoryError::Database(e),
            })?;

        Ok(row.into())
    }

    /// Order previously created with the same client token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_client_token(
        &self,
        profile_id: ProfileId,
        client_token: Uuid,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE profile_id = $1 AND client_token = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(profile_id)
            .bind(client_token)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// Record the uploaded proof and move `pending` to `submitted`.
    ///
    /// Returns `None` if the order is no longer pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn submit_payment_proof(
        &self,
        id: OrderId,
        proof_path: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.orders
            SET status = 'submitted', payment_proof_path = $2, submitted_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(proof_path)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// One of the customer's orders by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        profile_id: ProfileId,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE profile_id = $1 AND order_number = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(profile_id)
            .bind(order_number)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE profile_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(profile_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}
