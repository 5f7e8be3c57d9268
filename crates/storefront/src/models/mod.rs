//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types, plus the JSON views handed to the browser.

pub mod banner;
pub mod catalog;
pub mod order;
pub mod premium;
pub mod profile;
pub mod session;

pub use banner::Banner;
pub use catalog::{Product, ProductCard, ProductDetail, Variant, VariantView};
pub use order::{Order, OrderView};
pub use premium::PremiumContent;
pub use profile::{AccountView, MembershipView, Profile};
pub use session::{CurrentCustomer, keys as session_keys};
