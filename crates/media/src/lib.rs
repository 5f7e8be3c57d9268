//! Keystall Media - object storage for uploaded files.
//!
//! Product images and payment proofs live in one bucket under two prefixes:
//!
//! - `products/` - public, served by the storefront at `/media/{path}`
//! - `payment-proofs/` - private, streamed to admins only
//!
//! The backend is chosen at startup ([`StorageConfig`]): a local directory
//! for development, any S3-compatible bucket in production, or memory in
//! tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod config;
mod error;
mod image;
mod store;

pub use config::{S3Config, StorageBackend, StorageConfig};
pub use error::MediaError;
pub use image::{ImageKind, validate_image};
pub use store::{MediaStore, StoredFile};

/// Prefix for public product images.
pub const PRODUCT_IMAGE_PREFIX: &str = "products";

/// Prefix for private payment proof uploads.
pub const PAYMENT_PROOF_PREFIX: &str = "payment-proofs";
