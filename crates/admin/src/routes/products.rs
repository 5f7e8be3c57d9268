//! Product, variant and image handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use keystall_core::{Action, ProductId, Resource, ValidationErrors, VariantId};
use keystall_media::{PRODUCT_IMAGE_PREFIX, validate_image};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdminAuth;
use crate::models::{ActiveToggle, AdminProduct, AdminVariant, ProductInput, VariantInput};
use crate::state::AppState;

/// Multipart field holding the product image.
const IMAGE_FIELD: &str = "image";

/// A product with its image URL resolved.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: AdminProduct,
    pub image_url: Option<String>,
}

impl ProductView {
    fn new(state: &AppState, product: AdminProduct) -> Self {
        let image_url = product
            .image_path
            .as_deref()
            .map(|path| state.media().public_url(path));
        Self { product, image_url }
    }
}

/// Product detail with its variants.
#[derive(Debug, Serialize)]
pub struct ProductDetailView {
    #[serde(flatten)]
    pub product: ProductView,
    pub variants: Vec<AdminVariant>,
}

/// All products, active or not.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
) -> Result<Json<Vec<ProductView>>> {
    admin.require(Resource::Products, Action::View)?;
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductView::new(&state, p))
            .collect(),
    ))
}

/// One product with its variants.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn show(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetailView>> {
    admin.require(Resource::Products, Action::View)?;
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;
    let variants = repo.variants(id).await?;
    Ok(Json(ProductDetailView {
        product: ProductView::new(&state, product),
        variants,
    }))
}

/// Create a product.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Products, Action::Edit)?;
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool())
        .create(&input)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    add_breadcrumb("products", "Product created", None);
    Ok((StatusCode::CREATED, Json(ProductView::new(&state, product))))
}

/// Replace a product's fields.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductView>> {
    admin.require(Resource::Products, Action::Edit)?;
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(ProductView::new(&state, product)))
}

/// Show or hide a product in the storefront.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn set_active(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
    Json(toggle): Json<ActiveToggle>,
) -> Result<Json<ProductView>> {
    admin.require(Resource::Products, Action::Edit)?;
    let product = ProductRepository::new(state.pool())
        .set_active(id, toggle.is_active)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;

    tracing::info!(product_id = %id, is_active = toggle.is_active, "Product visibility changed");
    Ok(Json(ProductView::new(&state, product)))
}

/// Delete a product that has never been ordered, and its image.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    admin.require(Resource::Products, Action::Delete)?;
    let image_path = ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;

    if let Some(path) = image_path {
        remove_image(&state, &path).await;
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the product image.
///
/// The new file is stored before the row is updated; the previous file is
/// removed afterwards.
#[instrument(skip(state, admin, multipart), fields(profile_id = %admin.0.profile_id))]
pub async fn upload_image(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<ProductView>> {
    admin.require(Resource::Products, Action::Edit)?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some(IMAGE_FIELD) {
            image = Some(field.bytes().await.map_err(bad_multipart)?);
        }
    }
    let image = image
        .ok_or_else(|| AppError::Validation(ValidationErrors::single(IMAGE_FIELD, "is required")))?;

    let kind = validate_image(&image, state.config().product_image_max_bytes)?;
    let path = state
        .media()
        .put_image(PRODUCT_IMAGE_PREFIX, kind, image)
        .await?;

    let repo = ProductRepository::new(state.pool());
    let previous = match repo.set_image(id, &path).await {
        Ok(previous) => previous,
        Err(e) => {
            remove_image(&state, &path).await;
            return Err(AppError::from_repository(e, "Product"));
        }
    };
    if let Some(old) = previous.filter(|old| *old != path) {
        remove_image(&state, &old).await;
    }

    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;
    tracing::info!(product_id = %id, path = %path, "Product image replaced");
    Ok(Json(ProductView::new(&state, product)))
}

/// A product's variants, active or not.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn variants(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<AdminVariant>>> {
    admin.require(Resource::Products, Action::View)?;
    let repo = ProductRepository::new(state.pool());
    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound("Product".to_owned()));
    }
    Ok(Json(repo.variants(id).await?))
}

/// Add a variant.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn create_variant(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<ProductId>,
    Json(input): Json<VariantInput>,
) -> Result<impl IntoResponse> {
    admin.require(Resource::Products, Action::Edit)?;
    let input = input.validate()?;
    let variant = ProductRepository::new(state.pool())
        .create_variant(id, &input)
        .await
        .map_err(|e| AppError::from_repository(e, "Product"))?;

    tracing::info!(product_id = %id, variant_id = %variant.id, "Variant created");
    Ok((StatusCode::CREATED, Json(variant)))
}

/// Replace a variant's fields.
#[instrument(skip(state, admin, input), fields(profile_id = %admin.0.profile_id))]
pub async fn update_variant(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<VariantId>,
    Json(input): Json<VariantInput>,
) -> Result<Json<AdminVariant>> {
    admin.require(Resource::Products, Action::Edit)?;
    let input = input.validate()?;
    let variant = ProductRepository::new(state.pool())
        .update_variant(id, &input)
        .await
        .map_err(|e| AppError::from_repository(e, "Variant"))?;
    Ok(Json(variant))
}

/// Delete a variant.
#[instrument(skip(state, admin), fields(profile_id = %admin.0.profile_id))]
pub async fn delete_variant(
    State(state): State<AppState>,
    admin: RequireAdminAuth,
    Path(id): Path<VariantId>,
) -> Result<StatusCode> {
    admin.require(Resource::Products, Action::Delete)?;
    ProductRepository::new(state.pool())
        .delete_variant(id)
        .await
        .map_err(|e| AppError::from_repository(e, "Variant"))?;

    tracing::info!(variant_id = %id, "Variant deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Removal failures are logged, not returned.
async fn remove_image(state: &AppState, path: &str) {
    if let Err(e) = state.media().delete(path).await {
        tracing::warn!(error = %e, path, "Failed to remove product image");
    }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("malformed upload: {}", err.body_text()))
}
