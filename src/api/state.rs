//! Application state shared by handlers and middleware.

use std::sync::Arc;

use crate::infra::{Database, RateLimitStore};
use crate::services::{AuthService, CatalogService, OrderService, ServiceContainer, UserService};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub catalog_service: Arc<dyn CatalogService>,
    pub order_service: Arc<dyn OrderService>,
    /// Fixed-window counters for the rate limit middleware
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub database: Arc<Database>,
    /// Reported by the health endpoint
    pub environment: String,
}

impl AppState {
    pub fn new(
        services: &dyn ServiceContainer,
        rate_limiter: Arc<dyn RateLimitStore>,
        database: Arc<Database>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            catalog_service: services.catalog(),
            order_service: services.orders(),
            rate_limiter,
            database,
            environment: environment.into(),
        }
    }
}
