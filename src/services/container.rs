//! Service Container - centralized access to application services.
//!
//! Handlers only see the service traits; `Services::build` wires the
//! concrete implementations to the database, mailer, identity verifier
//! and email queue.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::{
    AuthService, Authenticator, CatalogManager, CatalogService, OrderNotifier, OrderService,
    UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{DataStore, IdentityVerifier, Mailer, Persistence};
use crate::jobs::EmailQueue;

#[cfg(test)]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(test, automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn catalog(&self) -> Arc<dyn CatalogService>;

    fn orders(&self) -> Arc<dyn OrderService>;
}

/// External collaborators the services are built on.
pub struct Dependencies {
    pub identity: Arc<dyn IdentityVerifier>,
    pub email_queue: Arc<dyn EmailQueue>,
    pub mailer: Arc<dyn Mailer>,
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    catalog_service: Arc<dyn CatalogService>,
    order_service: Arc<dyn OrderService>,
}

impl Services {
    /// Container from already-built services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        catalog_service: Arc<dyn CatalogService>,
        order_service: Arc<dyn OrderService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            catalog_service,
            order_service,
        }
    }

    /// Wire every service to one pooled database connection.
    pub fn build(db: DatabaseConnection, deps: Dependencies, config: Config) -> Self {
        let store: Arc<dyn DataStore> = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(
                store.clone(),
                deps.identity,
                deps.email_queue,
                config,
            )),
            user_service: Arc::new(UserManager::new(store.clone())),
            catalog_service: Arc::new(CatalogManager::new(store)),
            order_service: Arc::new(OrderNotifier::new(deps.mailer)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn catalog(&self) -> Arc<dyn CatalogService> {
        self.catalog_service.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.order_service.clone()
    }
}
