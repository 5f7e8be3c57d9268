//! Keystall Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Keystall components:
//! - `storefront` - Customer-facing catalog, checkout and order polling
//! - `admin` - Back-office for catalog, stock, banners and order verification
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Rules that both services must agree on (order
//! status transitions, pricing, permissions, delivered credential shapes) live
//! here so they are implemented once.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money and status enums
//! - [`credentials`] - Customer-supplied and delivered account credentials
//! - [`pricing`] - Flash sale and premium pricing
//! - [`permissions`] - Admin roles and per-resource permission bags
//! - [`stock`] - Manual and stock-key inventory levels
//! - [`validation`] - Field-level validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod credentials;
pub mod permissions;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

pub use credentials::{
    AccountCredentials, CredentialsError, CredentialsForm, DeliveredCredentials, DeliveryPlan,
};
pub use permissions::{Action, PermissionFlags, Permissions, Resource};
pub use pricing::{FlashSale, PremiumRule, PriceQuote, base_price, quote};
pub use stock::{StockCounts, StockLevel};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
