//! Business logic for the storefront.
//!
//! Services sit between route handlers and repositories: they validate
//! input, apply the store's rules and decide which repository calls to make.

pub mod auth;
pub mod checkout;

pub use auth::{AuthError, AuthService};
pub use checkout::{
    AccountInput, CheckoutError, CheckoutRequest, CheckoutService, SubmissionLimiter,
};
