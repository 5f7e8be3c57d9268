//! Status and kind enums for store entities.
//!
//! Every enum here serializes in `snake_case` and, with the `postgres`
//! feature, maps to an enum type in the `shop` schema. Type names are
//! unqualified; connections put `shop` on the `search_path`.

use serde::{Deserialize, Serialize};

/// How a purchased product's access is conveyed to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Seller delivers a login pair (username/email + password).
    Credentials,
    /// Seller delivers a coupon or license code as free text.
    Coupon,
    /// Customer supplies their own account; seller activates service on it.
    ManualActivation,
    /// A pre-loaded stock key is handed over.
    InstantKey,
}

impl DeliveryType {
    /// All delivery types, in display order.
    pub const ALL: [Self; 4] = [
        Self::Credentials,
        Self::Coupon,
        Self::ManualActivation,
        Self::InstantKey,
    ];

    /// Returns the database / wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Coupon => "coupon",
            Self::ManualActivation => "manual_activation",
            Self::InstantKey => "instant_key",
        }
    }

    /// Whether checkout must collect the customer's own account details.
    #[must_use]
    pub const fn requires_customer_account(&self) -> bool {
        matches!(self, Self::ManualActivation)
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid delivery type: {s}"))
    }
}

/// Order lifecycle status.
///
/// ```text
/// pending ──► submitted ──► completed
///    │            │
///    └────────────┴──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order row created, payment proof not yet attached.
    #[default]
    Pending,
    /// Payment proof attached; awaiting admin verification.
    Submitted,
    /// Verified; credentials delivered.
    Completed,
    /// Rejected by an admin or abandoned.
    Cancelled,
}

impl OrderStatus {
    /// Returns the database / wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the order can move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Submitted | Self::Cancelled)
                | (Self::Submitted, Self::Completed | Self::Cancelled)
        )
    }

    /// Completed and cancelled orders never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "submitted" => Ok(Self::Submitted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Stock key lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "stock_key_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StockKeyStatus {
    /// In inventory, not yet handed out.
    #[default]
    Available,
    /// Bound to exactly one order.
    Assigned,
    /// Past its expiry date.
    Expired,
    /// Withdrawn by an admin.
    Revoked,
}

impl StockKeyStatus {
    /// Returns the database / wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Whether a key can move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::Assigned | Self::Expired | Self::Revoked)
                | (Self::Assigned, Self::Expired | Self::Revoked)
        )
    }
}

impl std::fmt::Display for StockKeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StockKeyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            _ => Err(format!("invalid stock key status: {s}")),
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Unrestricted, including admin user management.
    SuperAdmin,
    /// Store management as granted by the permission bag.
    Admin,
    /// Order verification and read access as granted by the permission bag.
    Moderator,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Moderator => write!(f, "moderator"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// How a premium rule treats a product for members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "premium_access", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PremiumAccess {
    /// Members get the product for free.
    Free,
    /// Members get a percentage discount.
    Discount,
    /// Only members can see and buy the product.
    Exclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_transitions() {
        use OrderStatus::{Cancelled, Completed, Pending, Submitted};

        assert!(Pending.can_transition_to(Submitted));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Submitted.can_transition_to(Completed));
        assert!(Submitted.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Submitted.can_transition_to(Pending));
        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Submitted, Completed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_stock_key_transitions() {
        use StockKeyStatus::{Assigned, Available, Expired, Revoked};

        assert!(Available.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(Revoked));
        assert!(!Assigned.can_transition_to(Available));
        assert!(!Expired.can_transition_to(Available));
        assert!(!Revoked.can_transition_to(Assigned));
    }

    #[test]
    fn test_delivery_type_round_trips_names() {
        for kind in DeliveryType::ALL {
            assert_eq!(kind.as_str().parse::<DeliveryType>(), Ok(kind));
            assert_eq!(
                serde_json::to_string(&kind).ok(),
                Some(format!("\"{}\"", kind.as_str()))
            );
        }
        assert!("email".parse::<DeliveryType>().is_err());
    }

    #[test]
    fn test_only_manual_activation_needs_customer_account() {
        let needing: Vec<_> = DeliveryType::ALL
            .into_iter()
            .filter(DeliveryType::requires_customer_account)
            .collect();
        assert_eq!(needing, vec![DeliveryType::ManualActivation]);
    }

    #[test]
    fn test_admin_role_parse() {
        assert_eq!("moderator".parse::<AdminRole>(), Ok(AdminRole::Moderator));
        assert_eq!(AdminRole::SuperAdmin.to_string(), "super_admin");
        assert!("viewer".parse::<AdminRole>().is_err());
    }
}
