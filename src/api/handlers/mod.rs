//! HTTP request handlers.

pub mod admin_handler;
pub mod auth_handler;
pub mod health_handler;
pub mod jewelry_handler;
pub mod order_handler;
pub mod user_handler;

pub use admin_handler::admin_routes;
pub use auth_handler::{account_routes, auth_routes};
pub use health_handler::health_routes;
pub use jewelry_handler::jewelry_routes;
pub use order_handler::order_routes;
pub use user_handler::user_routes;

use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Parse a path id, answering 400 instead of axum's plain-text rejection.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("Invalid id: {}", raw)))
}
