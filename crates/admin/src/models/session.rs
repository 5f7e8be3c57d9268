//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use keystall_core::{Email, ProfileId};

/// Session-stored admin identity.
///
/// Only the identity lives in the session; role and permissions are
/// reloaded on every request so revocations apply immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Profile ID.
    pub profile_id: ProfileId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub display_name: String,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

impl From<&crate::models::AdminUser> for CurrentAdmin {
    fn from(admin: &crate::models::AdminUser) -> Self {
        Self {
            profile_id: admin.profile_id,
            email: admin.email.clone(),
            display_name: admin.display_name.clone(),
        }
    }
}
