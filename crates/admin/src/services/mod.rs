//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login and admin access management
//! - `export` - CSV exports of orders and products
//! - `verification` - Approving and rejecting submitted orders

pub mod auth;
pub mod export;
pub mod verification;

pub use auth::{AdminAuthError, AdminAuthService};
pub use export::{ExportError, orders_csv, products_csv};
pub use verification::{Approval, VerificationError, VerificationService};
