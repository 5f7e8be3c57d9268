//! Catalog types.
//!
//! [`Product`] and [`Variant`] are loaded from the database; the `*View` and
//! [`ProductCard`] types are what the catalog endpoints return, with prices
//! already quoted for the viewer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keystall_core::{
    DeliveryType, FlashSale, Money, PremiumAccess, PremiumRule, PriceQuote, ProductId, StockCounts,
    StockLevel, VariantId, base_price, quote,
};
use keystall_media::MediaStore;

/// An active product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Object path under `products/`.
    pub image_path: Option<String>,
    pub original_price: Money,
    pub sale_price: Option<Money>,
    /// What the store pays; snapshotted into orders for margin reports.
    pub cost_price: Option<Money>,
    pub delivery_type: DeliveryType,
    pub uses_stock_keys: bool,
    /// `None` means unlimited.
    pub manual_stock: Option<i32>,
    pub flash_sale: Option<FlashSale>,
    pub features: Vec<String>,
    pub premium: Option<PremiumRule>,
}

/// An active variant of a product.
#[derive(Debug, Clone)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub duration_days: Option<i32>,
    pub price: Money,
    /// Overrides the product's delivery type when set.
    pub delivery_type: Option<DeliveryType>,
    pub features: Vec<String>,
}

impl Product {
    /// Whether a viewer with this membership state may see the product.
    #[must_use]
    pub fn visible_to(&self, is_member: bool) -> bool {
        self.premium.is_none_or(|rule| rule.visible_to(is_member))
    }

    /// Price for the product or one of its variants at `now`.
    #[must_use]
    pub fn quote(
        &self,
        variant: Option<&Variant>,
        is_member: bool,
        now: DateTime<Utc>,
    ) -> PriceQuote {
        let base = base_price(
            variant.map(|v| v.price),
            self.sale_price,
            self.original_price,
        );
        quote(
            base,
            self.flash_sale.as_ref(),
            self.premium.as_ref(),
            is_member,
            now,
        )
    }

    /// Delivery type an order for `variant` gets.
    #[must_use]
    pub fn delivery_type_for(&self, variant: Option<&Variant>) -> DeliveryType {
        variant
            .and_then(|v| v.delivery_type)
            .unwrap_or(self.delivery_type)
    }

    /// Stock available for the product or one of its variants.
    #[must_use]
    pub fn stock(&self, counts: &StockCounts, variant: Option<VariantId>) -> StockLevel {
        counts.level(self.id, variant, self.uses_stock_keys, self.manual_stock)
    }
}

/// Product as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    pub delivery_type: DeliveryType,
    pub features: Vec<String>,
    pub price: PriceQuote,
    /// Set while a flash sale is running.
    pub flash_sale_ends_at: Option<DateTime<Utc>>,
    pub premium: Option<PremiumAccess>,
    pub stock: StockLevel,
    pub has_variants: bool,
}

/// Product detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub card: ProductCard,
    pub description: String,
    pub variants: Vec<VariantView>,
}

/// One purchasable variant with its own quote and stock.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: VariantId,
    pub name: String,
    pub duration_days: Option<i32>,
    pub delivery_type: DeliveryType,
    pub features: Vec<String>,
    pub price: PriceQuote,
    pub stock: StockLevel,
}

impl ProductCard {
    /// Build the listing view of a product.
    #[must_use]
    pub fn new(
        product: &Product,
        has_variants: bool,
        counts: &StockCounts,
        media: &MediaStore,
        is_member: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            image_url: product.image_path.as_deref().map(|p| media.public_url(p)),
            delivery_type: product.delivery_type,
            features: product.features.clone(),
            price: product.quote(None, is_member, now),
            flash_sale_ends_at: product
                .flash_sale
                .filter(|sale| sale.is_active(now))
                .map(|sale| sale.ends_at),
            premium: product.premium.map(|rule| rule.access),
            stock: product.stock(counts, None),
            has_variants,
        }
    }
}

impl VariantView {
    /// Build the view of one variant.
    #[must_use]
    pub fn new(
        product: &Product,
        variant: &Variant,
        counts: &StockCounts,
        is_member: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: variant.id,
            name: variant.name.clone(),
            duration_days: variant.duration_days,
            delivery_type: product.delivery_type_for(Some(variant)),
            features: variant.features.clone(),
            price: product.quote(Some(variant), is_member, now),
            stock: product.stock(counts, Some(variant.id)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
    }

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            slug: "streamflix-premium".to_owned(),
            name: "Streamflix Premium".to_owned(),
            description: String::new(),
            category: "streaming".to_owned(),
            image_path: Some("products/abc.png".to_owned()),
            original_price: "60".parse().unwrap(),
            sale_price: Some("50".parse().unwrap()),
            cost_price: Some("30".parse().unwrap()),
            delivery_type: DeliveryType::Credentials,
            uses_stock_keys: false,
            manual_stock: Some(4),
            flash_sale: Some(FlashSale {
                cut: "5".parse().unwrap(),
                ends_at: now() + Duration::hours(1),
            }),
            features: vec!["4K".to_owned()],
            premium: None,
        }
    }

    fn variant(delivery_type: Option<DeliveryType>) -> Variant {
        Variant {
            id: VariantId::new(70),
            product_id: ProductId::new(7),
            name: "3 months".to_owned(),
            duration_days: Some(90),
            price: "120".parse().unwrap(),
            delivery_type,
            features: vec![],
        }
    }

    #[test]
    fn test_variant_price_and_delivery_override() {
        let product = product();
        let v = variant(Some(DeliveryType::ManualActivation));
        assert_eq!(product.quote(Some(&v), false, now()).total, "115".parse().unwrap());
        assert_eq!(product.delivery_type_for(Some(&v)), DeliveryType::ManualActivation);
        assert_eq!(product.delivery_type_for(Some(&variant(None))), DeliveryType::Credentials);
        assert_eq!(product.delivery_type_for(None), DeliveryType::Credentials);
    }

    #[test]
    fn test_card_shows_running_flash_sale() {
        let product = product();
        let card = ProductCard::new(
            &product,
            true,
            &StockCounts::default(),
            &MediaStore::in_memory(),
            false,
            now(),
        );
        assert_eq!(card.price.total, "45".parse().unwrap());
        assert_eq!(card.flash_sale_ends_at, Some(now() + Duration::hours(1)));
        assert_eq!(card.stock, StockLevel::Limited(4));
        assert_eq!(card.image_url.as_deref(), Some("/media/products/abc.png"));

        let later = ProductCard::new(
            &product,
            true,
            &StockCounts::default(),
            &MediaStore::in_memory(),
            false,
            now() + Duration::hours(2),
        );
        assert_eq!(later.flash_sale_ends_at, None);
        assert_eq!(later.price.total, "50".parse().unwrap());
    }

    #[test]
    fn test_exclusive_products_hidden_from_non_members() {
        let mut product = product();
        assert!(product.visible_to(false));
        product.premium = Some(PremiumRule {
            access: PremiumAccess::Exclusive,
            discount_percent: None,
        });
        assert!(!product.visible_to(false));
        assert!(product.visible_to(true));
    }
}
