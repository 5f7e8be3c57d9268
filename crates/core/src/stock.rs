//! Stock levels.
//!
//! Keyed products count available stock keys; everything else uses the
//! product's manual counter, where `NULL` means unlimited.

use std::collections::HashMap;

use serde::Serialize;

use crate::{ProductId, VariantId};

/// How much of a product can still be sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "available", rename_all = "snake_case")]
pub enum StockLevel {
    /// No limit.
    Unlimited,
    /// This many units left.
    Limited(i64),
}

impl StockLevel {
    /// Stock level from the manual counter column.
    #[must_use]
    pub fn from_manual(manual_stock: Option<i32>) -> Self {
        manual_stock.map_or(Self::Unlimited, |n| Self::Limited(i64::from(n.max(0))))
    }

    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(n) => *n > 0,
        }
    }
}

/// Available stock-key counts, as reported by `shop.product_stock_counts()`.
///
/// A key without a variant can be handed out for any variant of its product.
#[derive(Debug, Clone, Default)]
pub struct StockCounts {
    counts: HashMap<(ProductId, Option<VariantId>), i64>,
}

impl StockCounts {
    /// Build from `(product, variant, available)` rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (ProductId, Option<VariantId>, i64)>) -> Self {
        let mut counts = HashMap::new();
        for (product, variant, available) in rows {
            *counts.entry((product, variant)).or_insert(0) += available;
        }
        Self { counts }
    }

    /// All available keys for a product, whatever variant they are bound to.
    #[must_use]
    pub fn for_product(&self, product: ProductId) -> i64 {
        self.counts
            .iter()
            .filter(|((p, _), _)| *p == product)
            .map(|(_, n)| n)
            .sum()
    }

    /// Keys usable for one variant: bound to it, or product-wide.
    #[must_use]
    pub fn for_variant(&self, product: ProductId, variant: VariantId) -> i64 {
        let bound = self.counts.get(&(product, Some(variant))).copied().unwrap_or(0);
        let shared = self.counts.get(&(product, None)).copied().unwrap_or(0);
        bound + shared
    }

    /// Stock level for a product or one of its variants.
    #[must_use]
    pub fn level(
        &self,
        product: ProductId,
        variant: Option<VariantId>,
        uses_stock_keys: bool,
        manual_stock: Option<i32>,
    ) -> StockLevel {
        if !uses_stock_keys {
            return StockLevel::from_manual(manual_stock);
        }
        StockLevel::Limited(match variant {
            Some(variant) => self.for_variant(product, variant),
            None => self.for_product(product),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> StockCounts {
        let p1 = ProductId::new(1);
        StockCounts::from_rows([
            (p1, None, 2),
            (p1, Some(VariantId::new(10)), 3),
            (p1, Some(VariantId::new(11)), 1),
            (ProductId::new(2), None, 5),
        ])
    }

    #[test]
    fn test_variant_counts_include_shared_keys() {
        let c = counts();
        assert_eq!(c.for_variant(ProductId::new(1), VariantId::new(10)), 5);
        assert_eq!(c.for_variant(ProductId::new(1), VariantId::new(12)), 2);
        assert_eq!(c.for_product(ProductId::new(1)), 6);
        assert_eq!(c.for_product(ProductId::new(3)), 0);
    }

    #[test]
    fn test_level_uses_manual_counter_for_unkeyed() {
        let c = counts();
        let p = ProductId::new(2);
        assert_eq!(c.level(p, None, false, None), StockLevel::Unlimited);
        assert_eq!(c.level(p, None, false, Some(0)), StockLevel::Limited(0));
        assert_eq!(c.level(p, None, true, Some(0)), StockLevel::Limited(5));
        assert!(!StockLevel::Limited(0).is_in_stock());
        assert!(StockLevel::Unlimited.is_in_stock());
    }
}
