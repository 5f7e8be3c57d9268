//! Customer profile types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keystall_core::{Email, ProfileId};

/// A customer profile (domain type).
#[derive(Debug, Clone)]
pub struct Profile {
    /// Unique profile ID.
    pub id: ProfileId,
    /// Login email, always lowercase.
    pub email: Email,
    /// Name shown in the storefront.
    pub display_name: String,
    /// Points earned from completed orders.
    pub loyalty_points: i32,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

/// `GET /api/account` response.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: ProfileId,
    pub email: Email,
    pub display_name: String,
    pub loyalty_points: i32,
    pub member_since: DateTime<Utc>,
    /// Premium membership, if one is running now.
    pub membership: Option<MembershipView>,
}

/// Active premium membership.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub starts_at: DateTime<Utc>,
    /// `None` for memberships without an end date.
    pub expires_at: Option<DateTime<Utc>>,
}
