//! Dashboard figures.

use serde::Serialize;

use keystall_core::{Money, ProductId};

/// Headline numbers for the back-office home page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Orders awaiting payment proof.
    pub pending_orders: i64,
    /// Orders awaiting verification.
    pub submitted_orders: i64,
    pub completed_today: i64,
    pub revenue_today: Money,
    pub revenue_30d: Money,
    /// Revenue minus recorded unit cost over the last 30 days.
    pub profit_30d: Money,
    pub active_products: i64,
    pub customers: i64,
    pub active_members: i64,
    pub low_stock: Vec<LowStockProduct>,
}

/// An active product running out of stock.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockProduct {
    pub product_id: ProductId,
    pub name: String,
    pub available: i64,
}
