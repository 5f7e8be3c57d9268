//! Public product images.

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use keystall_media::PRODUCT_IMAGE_PREFIX;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serve an object under `products/`. Anything else is not public.
pub async fn show(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse> {
    let is_public = path
        .strip_prefix(PRODUCT_IMAGE_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'));
    if !is_public {
        return Err(AppError::NotFound("File".to_owned()));
    }

    let file = state.media().get(&path).await?;
    Ok((
        [
            (CONTENT_TYPE, file.content_type),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        file.bytes,
    ))
}
