//! Price calculation shared by the catalog and checkout.
//!
//! The storefront shows a quote on product pages and checkout recomputes the
//! same quote server-side; the client-submitted price is never trusted.
//!
//! Order of operations:
//! 1. flash-sale cut, while the sale is running
//! 2. premium rule, for active members only
//! 3. round to two places (every [`Money`] is), never below zero

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, PremiumAccess};

/// A fixed amount cut from the price until `ends_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashSale {
    /// Amount subtracted from the base price.
    pub cut: Money,
    /// When the sale stops applying.
    pub ends_at: DateTime<Utc>,
}

impl FlashSale {
    /// Build from the nullable product columns; both must be set.
    #[must_use]
    pub const fn from_parts(cut: Option<Money>, ends_at: Option<DateTime<Utc>>) -> Option<Self> {
        match (cut, ends_at) {
            (Some(cut), Some(ends_at)) => Some(Self { cut, ends_at }),
            _ => None,
        }
    }

    /// Whether the sale applies at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.ends_at && !self.cut.is_zero()
    }
}

/// Premium membership rule for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRule {
    /// How members are treated.
    pub access: PremiumAccess,
    /// Percentage off for `discount` rules.
    pub discount_percent: Option<u8>,
}

impl PremiumRule {
    /// Whether non-members may see and buy the product.
    #[must_use]
    pub const fn visible_to(&self, is_member: bool) -> bool {
        is_member || !matches!(self.access, PremiumAccess::Exclusive)
    }
}

/// A computed price with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    /// Price before any reduction.
    pub base: Money,
    /// Amount removed by the flash sale.
    pub flash_sale_discount: Money,
    /// Amount removed by the premium rule.
    pub premium_discount: Money,
    /// What the customer pays.
    pub total: Money,
}

impl PriceQuote {
    /// Whether any reduction applied.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.total < self.base
    }
}

/// The price a product or variant starts from.
///
/// A variant price wins; otherwise the product's sale price, otherwise its
/// original price.
#[must_use]
pub fn base_price(
    variant_price: Option<Money>,
    sale_price: Option<Money>,
    original: Money,
) -> Money {
    variant_price.or(sale_price).unwrap_or(original)
}

/// Quote a price at `now`.
#[must_use]
pub fn quote(
    base: Money,
    flash_sale: Option<&FlashSale>,
    premium: Option<&PremiumRule>,
    is_member: bool,
    now: DateTime<Utc>,
) -> PriceQuote {
    let after_flash = match flash_sale {
        Some(sale) if sale.is_active(now) => base.saturating_sub(sale.cut),
        _ => base,
    };

    let total = match premium {
        Some(rule) if is_member => match rule.access {
            PremiumAccess::Free => Money::ZERO,
            PremiumAccess::Discount => {
                let off = after_flash.percent(rule.discount_percent.unwrap_or(0));
                after_flash.saturating_sub(off)
            }
            PremiumAccess::Exclusive => after_flash,
        },
        _ => after_flash,
    };

    PriceQuote {
        base,
        flash_sale_discount: base.saturating_sub(after_flash),
        premium_discount: after_flash.saturating_sub(total),
        total,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn sale(cut: &str, ends_in_hours: i64) -> FlashSale {
        FlashSale {
            cut: money(cut),
            ends_at: now() + Duration::hours(ends_in_hours),
        }
    }

    fn rule(access: PremiumAccess, percent: Option<u8>) -> PremiumRule {
        PremiumRule {
            access,
            discount_percent: percent,
        }
    }

    #[test]
    fn test_base_price_precedence() {
        let original = money("100");
        assert_eq!(base_price(Some(money("80")), Some(money("90")), original), money("80"));
        assert_eq!(base_price(None, Some(money("90")), original), money("90"));
        assert_eq!(base_price(None, None, original), original);
    }

    #[test]
    fn test_flash_sale_applies_until_end() {
        let running = sale("15000", 2);
        let q = quote(money("50000"), Some(&running), None, false, now());
        assert_eq!(q.total, money("35000"));
        assert_eq!(q.flash_sale_discount, money("15000"));

        let ended = sale("15000", 0);
        let q = quote(money("50000"), Some(&ended), None, false, now());
        assert_eq!(q.total, money("50000"));
        assert!(!q.is_discounted());
    }

    #[test]
    fn test_flash_sale_floors_at_zero() {
        let q = quote(money("10"), Some(&sale("25", 1)), None, false, now());
        assert_eq!(q.total, Money::ZERO);
        assert_eq!(q.flash_sale_discount, money("10"));
    }

    #[test]
    fn test_premium_rules_apply_to_members_only() {
        let free = rule(PremiumAccess::Free, None);
        assert_eq!(quote(money("30"), None, Some(&free), true, now()).total, Money::ZERO);
        assert_eq!(quote(money("30"), None, Some(&free), false, now()).total, money("30"));

        let exclusive = rule(PremiumAccess::Exclusive, None);
        assert_eq!(quote(money("30"), None, Some(&exclusive), true, now()).total, money("30"));
    }

    #[test]
    fn test_discount_applies_after_flash_sale() {
        let discount = rule(PremiumAccess::Discount, Some(10));
        let q = quote(money("100"), Some(&sale("20", 1)), Some(&discount), true, now());
        assert_eq!(q.flash_sale_discount, money("20"));
        assert_eq!(q.premium_discount, money("8"));
        assert_eq!(q.total, money("72"));
    }

    #[test]
    fn test_discount_rounds_to_cents() {
        let discount = rule(PremiumAccess::Discount, Some(15));
        let q = quote(money("9.99"), None, Some(&discount), true, now());
        // 15% of 9.99 = 1.4985 -> 1.50
        assert_eq!(q.total, money("8.49"));
        assert_eq!(q.total.to_string(), "8.49");
    }

    #[test]
    fn test_exclusive_visibility() {
        assert!(!rule(PremiumAccess::Exclusive, None).visible_to(false));
        assert!(rule(PremiumAccess::Exclusive, None).visible_to(true));
        assert!(rule(PremiumAccess::Discount, Some(5)).visible_to(false));
    }
}
