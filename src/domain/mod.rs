//! Domain layer - Core business entities and logic
//!
//! Users and the role hierarchy, federated identity reconciliation,
//! the jewelry catalog model and order confirmation rendering.
//! Nothing here touches the database or the network.

pub mod catalog;
pub mod identity;
pub mod jewelry;
pub mod order;
pub mod password;
pub mod user;

pub use catalog::{
    round_price, CatalogFilter, CatalogQuery, CatalogSort, CatalogStats, CategoryQuery,
    DashboardOverview, DashboardStats, GroupStat, SearchQuery, SortField, SortOrder,
};
pub use identity::{reconcile, AdminEmails, FederatedClaims, Reconciliation};
pub use jewelry::{
    Category, CreatedBy, DimensionUnit, Dimensions, Gender, ImageRef, Jewelry, JewelryResponse,
    JewelryUpdate, JewelryWithOwner, Material, NewJewelry, Subcategory, WeightUnit,
};
pub use order::{ConfirmationMessage, DeliveryAddress, OrderConfirmation, OrderItem};
pub use password::{generate_reset_token, Password};
pub use user::{normalize_email, NewUser, ProfileUpdate, User, UserResponse, UserRole};
