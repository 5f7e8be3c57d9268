//! Members-only content.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keystall_core::{PremiumContentId, ProductId};

/// Published premium content.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PremiumContent {
    pub id: PremiumContentId,
    pub title: String,
    pub body: String,
    /// Product the content belongs to, if any.
    pub product_id: Option<ProductId>,
    pub updated_at: DateTime<Utc>,
}
