//! Product and variant types for catalog management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystall_core::{DeliveryType, Money, ProductId, ValidationErrors, VariantId};

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 120;
/// Maximum product or variant name length.
pub const MAX_NAME_LENGTH: usize = 200;
/// Maximum category length.
pub const MAX_CATEGORY_LENGTH: usize = 60;
/// Maximum number of feature bullet points.
pub const MAX_FEATURES: usize = 20;
/// Maximum length of one feature bullet point.
pub const MAX_FEATURE_LENGTH: usize = 200;

/// A product as the back-office sees it, inactive ones included.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminProduct {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_path: Option<String>,
    pub original_price: Money,
    pub sale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub delivery_type: DeliveryType,
    pub uses_stock_keys: bool,
    pub manual_stock: Option<i32>,
    pub flash_sale_cut: Option<Money>,
    pub flash_sale_ends_at: Option<DateTime<Utc>>,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant as the back-office sees it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub duration_days: Option<i32>,
    pub price: Money,
    pub delivery_type: Option<DeliveryType>,
    pub features: Vec<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Create/update body for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub original_price: Money,
    pub sale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub uses_stock_keys: bool,
    /// `None` means unlimited.
    pub manual_stock: Option<i32>,
    pub flash_sale_cut: Option<Money>,
    pub flash_sale_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create/update body for a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub name: String,
    pub duration_days: Option<i32>,
    pub price: Money,
    pub delivery_type: Option<DeliveryType>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// `POST /api/products/{id}/active` body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActiveToggle {
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Whether `slug` is lowercase ASCII words joined by single hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(is_slug_byte))
}

const fn is_slug_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

fn normalize_features(errors: &mut ValidationErrors, features: &[String]) -> Vec<String> {
    let features: Vec<String> = features
        .iter()
        .map(|f| f.trim().to_owned())
        .filter(|f| !f.is_empty())
        .collect();
    if features.len() > MAX_FEATURES {
        errors.push("features", format!("at most {MAX_FEATURES} features"));
    }
    if features.iter().any(|f| f.chars().count() > MAX_FEATURE_LENGTH) {
        errors.push(
            "features",
            format!("each feature must be at most {MAX_FEATURE_LENGTH} characters"),
        );
    }
    features
}

impl ProductInput {
    /// Check and normalize the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.slug = self.slug.trim().to_ascii_lowercase();
        self.name = self.name.trim().to_owned();
        self.category = self.category.trim().to_ascii_lowercase();
        self.description = self.description.trim().to_owned();

        if !is_valid_slug(&self.slug) {
            errors.push(
                "slug",
                "must be lowercase letters and digits separated by hyphens",
            );
        }
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, MAX_NAME_LENGTH);
        errors.require("category", &self.category);
        errors.max_len("category", &self.category, MAX_CATEGORY_LENGTH);

        if self.sale_price.is_some_and(|sale| sale > self.original_price) {
            errors.push("sale_price", "cannot exceed the original price");
        }
        if self.manual_stock.is_some_and(|stock| stock < 0) {
            errors.push("manual_stock", "cannot be negative");
        }
        if self.uses_stock_keys && self.manual_stock.is_some() {
            errors.push("manual_stock", "must be empty for products using stock keys");
        }

        match (self.flash_sale_cut, self.flash_sale_ends_at) {
            (Some(cut), Some(_)) => {
                let base = self.sale_price.unwrap_or(self.original_price);
                if cut.is_zero() || cut > base {
                    errors.push("flash_sale_cut", "must be above zero and at most the price");
                }
            }
            (None, None) => {}
            _ => errors.push(
                "flash_sale_ends_at",
                "flash sale needs both a cut and an end time",
            ),
        }

        self.features = normalize_features(&mut errors, &self.features);
        errors.into_result()?;
        Ok(self)
    }
}

impl VariantInput {
    /// Check and normalize the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.name = self.name.trim().to_owned();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, MAX_NAME_LENGTH);
        if self.duration_days.is_some_and(|d| d <= 0) {
            errors.push("duration_days", "must be at least 1");
        }
        self.features = normalize_features(&mut errors, &self.features);
        errors.into_result()?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            slug: " Office-Suite-2026 ".to_owned(),
            name: " Office Suite ".to_owned(),
            description: String::new(),
            category: "Software".to_owned(),
            original_price: "120".parse().unwrap(),
            sale_price: Some("99".parse().unwrap()),
            cost_price: Some("40".parse().unwrap()),
            delivery_type: DeliveryType::InstantKey,
            uses_stock_keys: true,
            manual_stock: None,
            flash_sale_cut: None,
            flash_sale_ends_at: None,
            features: vec![" Lifetime ".to_owned(), String::new()],
            is_active: true,
        }
    }

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("streamflix-premium-4k"));
        assert!(!is_valid_slug("Streamflix"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_product_input_normalizes() {
        let product = input().validate().unwrap();
        assert_eq!(product.slug, "office-suite-2026");
        assert_eq!(product.name, "Office Suite");
        assert_eq!(product.category, "software");
        assert_eq!(product.features, vec!["Lifetime"]);
    }

    #[test]
    fn test_price_sanity() {
        let mut bad = input();
        bad.sale_price = Some("150".parse().unwrap());
        bad.manual_stock = Some(3);
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["sale_price", "manual_stock"]
        );
    }

    #[test]
    fn test_flash_sale_needs_both_parts() {
        let mut half = input();
        half.flash_sale_cut = Some("10".parse().unwrap());
        assert!(half.validate().is_err());

        let mut full = input();
        full.flash_sale_cut = Some("10".parse().unwrap());
        full.flash_sale_ends_at = Some(Utc::now() + Duration::hours(4));
        assert!(full.validate().is_ok());

        let mut too_deep = input();
        too_deep.flash_sale_cut = Some("100".parse().unwrap());
        too_deep.flash_sale_ends_at = Some(Utc::now() + Duration::hours(4));
        assert!(too_deep.validate().is_err());
    }

    #[test]
    fn test_variant_duration() {
        let variant = VariantInput {
            name: "1 month".to_owned(),
            duration_days: Some(0),
            price: "10".parse().unwrap(),
            delivery_type: None,
            features: vec![],
            sort_order: 0,
            is_active: true,
        };
        assert!(variant.validate().is_err());
    }
}
