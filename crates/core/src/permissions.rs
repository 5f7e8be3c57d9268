//! Admin permissions.
//!
//! Every admin has a role and a permission bag stored as JSON:
//!
//! ```json
//! { "orders": { "view": true, "edit": true, "delete": false } }
//! ```
//!
//! `super_admin` ignores the bag. Other roles are granted exactly what the
//! bag says; missing resources deny everything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::AdminRole;

/// Something an admin can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Products and variants.
    Products,
    /// Stock keys and counts.
    StockKeys,
    /// Orders and verification.
    Orders,
    /// Promotional banners.
    Banners,
    /// Admin accounts.
    AdminUsers,
    /// Memberships, premium product rules and content.
    Premium,
}

impl Resource {
    /// All resources.
    pub const ALL: [Self; 6] = [
        Self::Products,
        Self::StockKeys,
        Self::Orders,
        Self::Banners,
        Self::AdminUsers,
        Self::Premium,
    ];

    /// Name used in the permission bag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::StockKeys => "stock_keys",
            Self::Orders => "orders",
            Self::Banners => "banners",
            Self::AdminUsers => "admin_users",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an admin wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read.
    View,
    /// Create or modify.
    Edit,
    /// Remove.
    Delete,
}

impl Action {
    /// All actions.
    pub const ALL: [Self; 3] = [Self::View, Self::Edit, Self::Delete];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
        })
    }
}

/// Granted actions for one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PermissionFlags {
    /// May read.
    #[serde(default)]
    pub view: bool,
    /// May create or modify.
    #[serde(default)]
    pub edit: bool,
    /// May remove.
    #[serde(default)]
    pub delete: bool,
}

impl PermissionFlags {
    /// Every action.
    pub const ALL: Self = Self {
        view: true,
        edit: true,
        delete: true,
    };

    /// Read only.
    pub const VIEW: Self = Self {
        view: true,
        edit: false,
        delete: false,
    };

    /// Whether `action` is granted.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }
}

/// Permission bag keyed by resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<Resource, PermissionFlags>);

impl Permissions {
    /// Default bag for a newly created admin of `role`.
    #[must_use]
    pub fn default_for(role: AdminRole) -> Self {
        let mut bag = BTreeMap::new();
        match role {
            AdminRole::SuperAdmin => {
                for resource in Resource::ALL {
                    bag.insert(resource, PermissionFlags::ALL);
                }
            }
            AdminRole::Admin => {
                for resource in Resource::ALL {
                    bag.insert(resource, PermissionFlags::ALL);
                }
                bag.insert(Resource::AdminUsers, PermissionFlags::VIEW);
            }
            AdminRole::Moderator => {
                bag.insert(Resource::Products, PermissionFlags::VIEW);
                bag.insert(Resource::StockKeys, PermissionFlags::VIEW);
                bag.insert(Resource::Banners, PermissionFlags::VIEW);
                bag.insert(
                    Resource::Orders,
                    PermissionFlags {
                        view: true,
                        edit: true,
                        delete: false,
                    },
                );
            }
        }
        Self(bag)
    }

    /// Flags for a resource (all false when absent).
    #[must_use]
    pub fn get(&self, resource: Resource) -> PermissionFlags {
        self.0.get(&resource).copied().unwrap_or_default()
    }

    /// Replace the flags for a resource.
    pub fn set(&mut self, resource: Resource, flags: PermissionFlags) {
        self.0.insert(resource, flags);
    }

    /// Whether an admin with `role` and this bag may perform `action`.
    #[must_use]
    pub fn allows(&self, role: AdminRole, resource: Resource, action: Action) -> bool {
        role == AdminRole::SuperAdmin || self.get(resource).allows(action)
    }

    /// First grant in this bag that an admin with `role` and `held` lacks.
    #[must_use]
    pub fn first_not_held(&self, role: AdminRole, held: &Self) -> Option<(Resource, Action)> {
        self.0.iter().find_map(|(&resource, flags)| {
            Action::ALL
                .into_iter()
                .find(|&action| flags.allows(action) && !held.allows(role, resource, action))
                .map(|action| (resource, action))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_ignores_bag() {
        let empty = Permissions::default();
        for resource in Resource::ALL {
            assert!(empty.allows(AdminRole::SuperAdmin, resource, Action::Delete));
        }
    }

    #[test]
    fn test_admin_defaults() {
        let bag = Permissions::default_for(AdminRole::Admin);
        assert!(bag.allows(AdminRole::Admin, Resource::Products, Action::Delete));
        assert!(bag.allows(AdminRole::Admin, Resource::AdminUsers, Action::View));
        assert!(!bag.allows(AdminRole::Admin, Resource::AdminUsers, Action::Edit));
        assert!(!bag.allows(AdminRole::Admin, Resource::AdminUsers, Action::Delete));
    }

    #[test]
    fn test_moderator_defaults() {
        let bag = Permissions::default_for(AdminRole::Moderator);
        let role = AdminRole::Moderator;
        assert!(bag.allows(role, Resource::Orders, Action::Edit));
        assert!(!bag.allows(role, Resource::Orders, Action::Delete));
        assert!(bag.allows(role, Resource::Products, Action::View));
        assert!(!bag.allows(role, Resource::Products, Action::Edit));
        assert!(!bag.allows(role, Resource::Premium, Action::View));
        assert!(!bag.allows(role, Resource::AdminUsers, Action::View));
    }

    #[test]
    fn test_bag_json_shape() {
        let json = r#"{"orders":{"view":true,"edit":true},"banners":{"view":true}}"#;
        let bag: Permissions = serde_json::from_str(json).unwrap();
        assert!(bag.allows(AdminRole::Admin, Resource::Orders, Action::Edit));
        assert!(!bag.allows(AdminRole::Admin, Resource::Orders, Action::Delete));
        assert!(!bag.allows(AdminRole::Admin, Resource::Banners, Action::Edit));
        assert_eq!(bag.get(Resource::Products), PermissionFlags::default());

        let out = serde_json::to_value(&bag).unwrap();
        assert_eq!(out["orders"]["delete"], false);
    }

    #[test]
    fn test_first_not_held() {
        let admin = Permissions::default_for(AdminRole::Admin);
        let moderator = Permissions::default_for(AdminRole::Moderator);

        assert_eq!(moderator.first_not_held(AdminRole::Admin, &admin), None);
        assert_eq!(
            admin.first_not_held(AdminRole::Moderator, &moderator),
            Some((Resource::Products, Action::Edit))
        );
        assert_eq!(
            Permissions::default_for(AdminRole::SuperAdmin)
                .first_not_held(AdminRole::Admin, &admin),
            Some((Resource::AdminUsers, Action::Edit))
        );
        assert_eq!(
            admin.first_not_held(AdminRole::SuperAdmin, &Permissions::default()),
            None
        );
        assert_eq!(Resource::StockKeys.to_string(), "stock_keys");
    }

    #[test]
    fn test_unknown_resource_rejected() {
        assert!(serde_json::from_str::<Permissions>(r#"{"reports":{"view":true}}"#).is_err());
    }
}
