//! Catalog writes: products and variants.

use sqlx::PgPool;

use keystall_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::{AdminProduct, AdminVariant, ProductInput, VariantInput};

const PRODUCT_COLUMNS: &str = r"
    id, slug, name, description, category, image_path, original_price,
    sale_price, cost_price, delivery_type, uses_stock_keys, manual_stock,
    flash_sale_cut, flash_sale_ends_at, features, is_active, created_at,
    updated_at
";

const VARIANT_COLUMNS: &str = r"
    id, product_id, name, duration_days, price, delivery_type, features,
    sort_order, is_active
";

const SLUG_TAKEN: &str = "slug already exists";

/// Repository for products and their variants.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminProduct>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.products ORDER BY category, name");
        let products = sqlx::query_as::<_, AdminProduct>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<AdminProduct>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1");
        let product = sqlx::query_as::<_, AdminProduct>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Create a product from a validated form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<AdminProduct, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.products (
                slug, name, description, category, original_price, sale_price,
                cost_price, delivery_type, uses_stock_keys, manual_stock,
                flash_sale_cut, flash_sale_ends_at, features, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let product = sqlx::query_as::<_, AdminProduct>(&sql)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.original_price)
            .bind(input.sale_price)
            .bind(input.cost_price)
            .bind(input.delivery_type)
            .bind(input.uses_stock_keys)
            .bind(input.manual_stock)
            .bind(input.flash_sale_cut)
            .bind(input.flash_sale_ends_at)
            .bind(&input.features)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, SLUG_TAKEN))?;
        Ok(product)
    }

    /// Replace a product's editable fields. The image is left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<AdminProduct, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.products
            SET slug = $2, name = $3, description = $4, category = $5,
                original_price = $6, sale_price = $7, cost_price = $8,
                delivery_type = $9, uses_stock_keys = $10, manual_stock = $11,
                flash_sale_cut = $12, flash_sale_ends_at = $13, features = $14,
                is_active = $15
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        sqlx::query_as::<_, AdminProduct>(&sql)
            .bind(id)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.original_price)
            .bind(input.sale_price)
            .bind(input.cost_price)
            .bind(input.delivery_type)
            .bind(input.uses_stock_keys)
            .bind(input.manual_stock)
            .bind(input.flash_sale_cut)
            .bind(input.flash_sale_ends_at)
            .bind(&input.features)
            .bind(input.is_active)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, SLUG_TAKEN))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Show or hide a product in the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<AdminProduct, RepositoryError> {
        let sql = format!(
            "UPDATE shop.products SET is_active = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, AdminProduct>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Point the product at a new image, returning the previous path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn set_image(
        &self,
        id: ProductId,
        image_path: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r"
            UPDATE shop.products p
            SET image_path = $2
            FROM shop.products prev
            WHERE p.id = $1 AND prev.id = p.id
            RETURNING prev.image_path
            ",
        )
        .bind(id)
        .bind(image_path)
        .fetch_optional(self.pool)
        .await?;

        previous.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Products with orders cannot be deleted; deactivate
    /// them instead.
    ///
    /// Returns the image path so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID and
    /// `RepositoryError::Conflict` if orders reference the product.
    pub async fn delete(&self, id: ProductId) -> Result<Option<String>, RepositoryError> {
        let image: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM shop.products WHERE id = $1 RETURNING image_path")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_constraint(
                        e,
                        "product has orders; deactivate it instead",
                    )
                })?;

        image.ok_or(RepositoryError::NotFound)
    }

    /// Variants of a product in display order, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<AdminVariant>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {VARIANT_COLUMNS}
            FROM shop.product_variants
            WHERE product_id = $1
            ORDER BY sort_order, id
            "
        );
        let variants = sqlx::query_as::<_, AdminVariant>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;
        Ok(variants)
    }

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist.
    pub async fn create_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<AdminVariant, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.product_variants (
                product_id, name, duration_days, price, delivery_type, features,
                sort_order, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {VARIANT_COLUMNS}
            "
        );
        let variant = sqlx::query_as::<_, AdminVariant>(&sql)
            .bind(product_id)
            .bind(&input.name)
            .bind(input.duration_days)
            .bind(input.price)
            .bind(input.delivery_type)
            .bind(&input.features)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product does not exist"))?;
        Ok(variant)
    }

    /// Replace a variant's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn update_variant(
        &self,
        id: VariantId,
        input: &VariantInput,
    ) -> Result<AdminVariant, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.product_variants
            SET name = $2, duration_days = $3, price = $4, delivery_type = $5,
                features = $6, sort_order = $7, is_active = $8
            WHERE id = $1
            RETURNING {VARIANT_COLUMNS}
            "
        );
        sqlx::query_as::<_, AdminVariant>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(input.duration_days)
            .bind(input.price)
            .bind(input.delivery_type)
            .bind(&input.features)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a variant. Orders keep their name snapshot; variant-bound
    /// stock keys become product-wide.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete_variant(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_variants WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
