//! Load a catalog from YAML.
//!
//! ```yaml
//! products:
//!   - slug: streamflix-premium
//!     name: Streamflix Premium
//!     category: streaming
//!     original_price: "60.00"
//!     delivery_type: credentials
//!     variants:
//!       - name: 3 months
//!         duration_days: 90
//!         price: "150.00"
//!     keys: []
//! banners:
//!   - title: Weekend sale
//!     gradient: "from-pink-500 to-orange-400"
//!     icon: flame
//! ```
//!
//! Products whose slug already exists are skipped, so the file can be
//! applied repeatedly.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use keystall_admin::db::{BannerRepository, ProductRepository, RepositoryError, StockKeyRepository};
use keystall_admin::models::{BannerInput, ProductInput, StockKeyImport, VariantInput};
use keystall_core::{ProductId, ValidationErrors, VariantId};

use super::{CommandError, connect};

/// Note stored on seeded stock keys.
const SEED_NOTE: &str = "seed";

/// Errors loading a catalog.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{item}: {errors}")]
    Invalid {
        item: String,
        errors: ValidationErrors,
    },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top level of the seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub banners: Vec<BannerInput>,
}

/// A product with its variants and stock keys.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
    /// Product-wide keys.
    #[serde(default)]
    pub keys: Vec<String>,
}

/// A variant with keys bound to it.
#[derive(Debug, Deserialize)]
pub struct SeedVariant {
    #[serde(flatten)]
    pub variant: VariantInput,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// What a seed run did.
#[derive(Debug, Default)]
struct SeedSummary {
    products: usize,
    skipped_products: usize,
    variants: usize,
    keys: u64,
    banners: usize,
}

/// Parse and validate the whole file before touching the database.
///
/// # Errors
///
/// Returns the first invalid product or banner.
pub fn parse_catalog(content: &str) -> Result<CatalogFile, SeedError> {
    let file: CatalogFile = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(file.products.len());
    for seed in file.products {
        let slug = seed.product.slug.clone();
        let invalid = |errors| SeedError::Invalid {
            item: format!("product {slug}"),
            errors,
        };
        let product = seed.product.validate().map_err(invalid)?;
        let variants = seed
            .variants
            .into_iter()
            .map(|v| {
                Ok(SeedVariant {
                    variant: v.variant.validate()?,
                    keys: v.keys,
                })
            })
            .collect::<Result<Vec<_>, ValidationErrors>>()
            .map_err(invalid)?;
        products.push(SeedProduct {
            product,
            variants,
            keys: seed.keys,
        });
    }

    let banners = file
        .banners
        .into_iter()
        .map(|banner| {
            let title = banner.title.clone();
            banner.validate().map_err(|errors| SeedError::Invalid {
                item: format!("banner {title}"),
                errors,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CatalogFile { products, banners })
}

/// Load the catalog in `path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a write fails.
pub async fn catalog(path: &Path) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let file = parse_catalog(&content)?;
    tracing::info!(
        products = file.products.len(),
        banners = file.banners.len(),
        "Parsed catalog"
    );

    let pool = connect().await?;
    let mut summary = SeedSummary::default();

    for seed in &file.products {
        seed_product(&pool, seed, &mut summary).await?;
    }

    let banners = BannerRepository::new(&pool);
    for banner in &file.banners {
        banners.create(banner).await?;
        summary.banners += 1;
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Products created: {}", summary.products);
    tracing::info!("  Products skipped (slug exists): {}", summary.skipped_products);
    tracing::info!("  Variants created: {}", summary.variants);
    tracing::info!("  Stock keys inserted: {}", summary.keys);
    tracing::info!("  Banners created: {}", summary.banners);
    Ok(())
}

async fn seed_product(
    pool: &PgPool,
    seed: &SeedProduct,
    summary: &mut SeedSummary,
) -> Result<(), SeedError> {
    let products = ProductRepository::new(pool);
    let product = match products.create(&seed.product).await {
        Ok(product) => product,
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!(slug = %seed.product.slug, "Product exists, skipping");
            summary.skipped_products += 1;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    summary.products += 1;

    summary.keys += import_keys(pool, product.id, None, &seed.keys).await?;
    for seed_variant in &seed.variants {
        let variant = products
            .create_variant(product.id, &seed_variant.variant)
            .await?;
        summary.variants += 1;
        summary.keys += import_keys(pool, product.id, Some(variant.id), &seed_variant.keys).await?;
    }

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product seeded");
    Ok(())
}

async fn import_keys(
    pool: &PgPool,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    keys: &[String],
) -> Result<u64, SeedError> {
    if keys.is_empty() {
        return Ok(0);
    }
    let batch = StockKeyImport {
        variant_id,
        keys: keys.join("\n"),
        note: Some(SEED_NOTE.to_owned()),
        expires_at: None,
    }
    .into_batch(Utc::now())
    .map_err(|errors| SeedError::Invalid {
        item: format!("keys for product {product_id}"),
        errors,
    })?;

    let result = StockKeyRepository::new(pool)
        .bulk_import(product_id, &batch)
        .await?;
    Ok(result.inserted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keystall_core::DeliveryType;

    use super::*;

    const CATALOG: &str = r#"
products:
  - slug: office-suite
    name: Office Suite
    category: Software
    original_price: "25.00"
    sale_price: "19.99"
    delivery_type: instant_key
    uses_stock_keys: true
    keys:
      - AAAA-1111
      - BBBB-2222
  - slug: streamflix-premium
    name: Streamflix Premium
    category: streaming
    original_price: "60"
    delivery_type: credentials
    manual_stock: 5
    variants:
      - name: 3 months
        duration_days: 90
        price: "150"
banners:
  - title: Weekend sale
    gradient: from-pink-500 to-orange-400
    icon: flame
    link_url: /products/office-suite
"#;

    #[test]
    fn test_parse_catalog() {
        let file = parse_catalog(CATALOG).unwrap();
        assert_eq!(file.products.len(), 2);

        let office = &file.products[0];
        assert_eq!(office.product.category, "software");
        assert_eq!(office.product.delivery_type, DeliveryType::InstantKey);
        assert_eq!(office.keys.len(), 2);
        assert!(office.product.is_active);

        let streaming = &file.products[1];
        assert_eq!(streaming.variants.len(), 1);
        assert_eq!(streaming.variants[0].variant.duration_days, Some(90));

        assert_eq!(file.banners.len(), 1);
        assert!(file.banners[0].is_active);
    }

    #[test]
    fn test_invalid_product_names_the_slug() {
        let yaml = r#"
products:
  - slug: bad
    name: Bad
    category: misc
    original_price: "10"
    sale_price: "12"
    delivery_type: coupon
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(err, SeedError::Invalid { ref item, .. } if item == "product bad"));
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = parse_catalog("{}").unwrap();
        assert!(file.products.is_empty());
        assert!(file.banners.is_empty());
    }
}
