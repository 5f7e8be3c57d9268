//! Catalog reads: products, variants and stock counts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keystall_core::{
    DeliveryType, FlashSale, Money, PremiumAccess, PremiumRule, ProductId, StockCounts, VariantId,
};

use super::RepositoryError;
use crate::models::{Product, Variant};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.slug, p.name, p.description, p.category, p.image_path,
    p.original_price, p.sale_price, p.cost_price, p.delivery_type,
    p.uses_stock_keys, p.manual_stock, p.flash_sale_cut, p.flash_sale_ends_at,
    p.features, pp.access AS premium_access, pp.discount_percent
";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    slug: String,
    name: String,
    description: String,
    category: String,
    image_path: Option<String>,
    original_price: Money,
    sale_price: Option<Money>,
    cost_price: Option<Money>,
    delivery_type: DeliveryType,
    uses_stock_keys: bool,
    manual_stock: Option<i32>,
    flash_sale_cut: Option<Money>,
    flash_sale_ends_at: Option<DateTime<Utc>>,
    features: Vec<String>,
    premium_access: Option<PremiumAccess>,
    discount_percent: Option<i16>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let premium = match row.premium_access {
            Some(access) => Some(PremiumRule {
                access,
                discount_percent: row
                    .discount_percent
                    .map(u8::try_from)
                    .transpose()
                    .map_err(|_| {
                        RepositoryError::DataCorruption(format!(
                            "discount percent out of range for product {}",
                            row.id
                        ))
                    })?,
            }),
            None => None,
        };

        Ok(Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            category: row.category,
            image_path: row.image_path,
            original_price: row.original_price,
            sale_price: row.sale_price,
            cost_price: row.cost_price,
            delivery_type: row.delivery_type,
            uses_stock_keys: row.uses_stock_keys,
            manual_stock: row.manual_stock,
            flash_sale: FlashSale::from_parts(row.flash_sale_cut, row.flash_sale_ends_at),
            features: row.features,
            premium,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: VariantId,
    product_id: ProductId,
    name: String,
    duration_days: Option<i32>,
    price: Money,
    delivery_type: Option<DeliveryType>,
    features: Vec<String>,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            duration_days: row.duration_days,
            price: row.price,
            delivery_type: row.delivery_type,
            features: row.features,
        }
    }
}

/// Repository for catalog reads. Only active rows are ever returned.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products, optionally in one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.products p
            LEFT JOIN shop.premium_products pp ON pp.product_id = p.id
            WHERE p.is_active AND ($1::text IS NULL OR p.category = $1)
            ORDER BY p.category, p.name
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.products p
            LEFT JOIN shop.premium_products pp ON pp.product_id = p.id
            WHERE p.is_active AND p.slug = $1
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.products p
            LEFT JOIN shop.premium_products pp ON pp.product_id = p.id
            WHERE p.is_active AND p.id = $1
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Active variants of the given products, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Variant>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, name, duration_days, price, delivery_type, features
            FROM shop.product_variants
            WHERE is_active AND product_id = ANY($1)
            ORDER BY product_id, sort_order, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Variant::from).collect())
    }

    /// Available stock keys per product and variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_counts(&self) -> Result<StockCounts, RepositoryError> {
        let rows: Vec<(ProductId, Option<VariantId>, i64)> = sqlx::query_as(
            r"
            SELECT stock_product_id, stock_variant_id, available_count
            FROM shop.product_stock_counts()
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(StockCounts::from_rows(rows))
    }
}
