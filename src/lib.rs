//! Jewelry Showcase API
//!
//! Backend for a jewelry storefront: a public catalog with filtering,
//! search and statistics, local and federated accounts with a three-level
//! role hierarchy, catalog administration, and order confirmation email.
//!
//! # Layers
//!
//! - **cli** / **commands**: `serve`, `migrate`, `jobs`
//! - **config**: environment settings and constants
//! - **domain**: users, identity reconciliation, catalog, orders
//! - **services**: use cases behind traits
//! - **infra**: SeaORM persistence, Redis, mail, identity provider
//! - **jobs**: queued email delivery
//! - **api**: axum handlers, middleware and routes
//! - **types**: pagination and shared responses
//! - **errors**: `AppError` and its HTTP mapping
//!
//! ```bash
//! jewelry-showcase migrate up
//! jewelry-showcase serve --port 5000
//! jewelry-showcase jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::{create_router, AppState};
pub use config::Config;
pub use domain::{Jewelry, User, UserRole};
pub use errors::{AppError, AppResult};
