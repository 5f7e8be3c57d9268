//! Promotional banners.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keystall_core::BannerId;

/// A banner currently inside its display window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    /// CSS gradient for the banner background.
    pub gradient: String,
    /// Icon name.
    pub icon: String,
    pub link_url: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
}
