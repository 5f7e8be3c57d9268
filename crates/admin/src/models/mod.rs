//! Domain models for admin.

pub mod admin_user;
pub mod banner;
pub mod dashboard;
pub mod order;
pub mod premium;
pub mod product;
pub mod session;
pub mod stock_key;

pub use admin_user::{AdminUser, NewAdminInput, PromoteInput, UpdateAdminInput};
pub use banner::{Banner, BannerInput, BannerOrder};
pub use dashboard::{DashboardStats, LowStockProduct};
pub use order::{OrderDetail, OrderExportRow, OrderFilter, OrderSummary, RejectInput};
pub use premium::{
    GrantMembershipInput, Membership, PremiumContent, PremiumContentInput, PremiumProduct,
    PremiumRuleInput,
};
pub use product::{ActiveToggle, AdminProduct, AdminVariant, ProductInput, VariantInput};
pub use session::{CurrentAdmin, keys as session_keys};
pub use stock_key::{ImportBatch, ImportResult, StockCountRow, StockKey, StockKeyImport};
