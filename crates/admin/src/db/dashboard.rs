//! Dashboard aggregates.

use sqlx::PgPool;

use keystall_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{DashboardStats, LowStockProduct};

/// Products at or below this many units show up as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 3;

#[derive(sqlx::FromRow)]
struct CountsRow {
    pending_orders: i64,
    submitted_orders: i64,
    completed_today: i64,
    revenue_today: Money,
    revenue_30d: Money,
    cost_30d: Money,
    active_products: i64,
    customers: i64,
    active_members: i64,
}

/// Repository for dashboard figures.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Order, revenue and stock figures. Days are UTC days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let counts = sqlx::query_as::<_, CountsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.orders WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM shop.orders WHERE status = 'submitted') AS submitted_orders,
                (SELECT COUNT(*) FROM shop.orders
                 WHERE status = 'completed' AND completed_at >= date_trunc('day', now())
                ) AS completed_today,
                (SELECT COALESCE(SUM(total), 0) FROM shop.orders
                 WHERE status = 'completed' AND completed_at >= date_trunc('day', now())
                ) AS revenue_today,
                (SELECT COALESCE(SUM(total), 0) FROM shop.orders
                 WHERE status = 'completed' AND completed_at >= now() - interval '30 days'
                ) AS revenue_30d,
                (SELECT COALESCE(SUM(unit_cost), 0) FROM shop.orders
                 WHERE status = 'completed' AND completed_at >= now() - interval '30 days'
                ) AS cost_30d,
                (SELECT COUNT(*) FROM shop.products WHERE is_active) AS active_products,
                (SELECT COUNT(*) FROM shop.profiles p
                 WHERE NOT EXISTS (
                     SELECT 1 FROM shop.admin_permissions a WHERE a.profile_id = p.id
                 )
                ) AS customers,
                (SELECT COUNT(DISTINCT profile_id) FROM shop.premium_memberships
                 WHERE is_active AND starts_at <= now()
                   AND (expires_at IS NULL OR expires_at > now())
                ) AS active_members
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let low_stock: Vec<(ProductId, String, i64)> = sqlx::query_as(
            r"
            SELECT pr.id, pr.name,
                   CASE WHEN pr.uses_stock_keys
                        THEN COALESCE((
                            SELECT SUM(c.available_count)::bigint
                            FROM shop.product_stock_counts() c
                            WHERE c.stock_product_id = pr.id
                        ), 0)
                        ELSE pr.manual_stock::bigint
                   END AS available
            FROM shop.products pr
            WHERE pr.is_active AND (pr.uses_stock_keys OR pr.manual_stock IS NOT NULL)
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut low_stock: Vec<LowStockProduct> = low_stock
            .into_iter()
            .filter(|(_, _, available)| *available <= LOW_STOCK_THRESHOLD)
            .map(|(product_id, name, available)| LowStockProduct {
                product_id,
                name,
                available,
            })
            .collect();
        low_stock.sort_by(|a, b| a.available.cmp(&b.available).then_with(|| a.name.cmp(&b.name)));

        Ok(DashboardStats {
            pending_orders: counts.pending_orders,
            submitted_orders: counts.submitted_orders,
            completed_today: counts.completed_today,
            revenue_today: counts.revenue_today,
            revenue_30d: counts.revenue_30d,
            profit_30d: counts.revenue_30d.saturating_sub(counts.cost_30d),
            active_products: counts.active_products,
            customers: counts.customers,
            active_members: counts.active_members,
            low_stock,
        })
    }
}
