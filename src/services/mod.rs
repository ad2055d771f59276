//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on repository and gateway traits,
//! never on SeaORM or SMTP directly.

mod auth_service;
mod catalog_service;
pub mod container;
mod order_service;
mod user_service;

// Service Container
pub use container::{Dependencies, ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, AuthSession, Authenticator, Claims, Registration};
pub use catalog_service::{CatalogManager, CatalogService};
pub use order_service::{OrderNotifier, OrderService};
pub use user_service::{UserManager, UserService};

#[cfg(test)]
pub use container::MockServiceContainer;
