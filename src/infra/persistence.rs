//! Single access point to all repositories.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{JewelryRepository, JewelryStore, UserRepository, UserStore};

#[cfg(test)]
use mockall::automock;

/// Repository provider handed to services.
#[cfg_attr(test, automock)]
pub trait DataStore: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn jewelry(&self) -> Arc<dyn JewelryRepository>;
}

/// Repositories sharing one pooled connection
pub struct Persistence {
    users: Arc<UserStore>,
    jewelry: Arc<JewelryStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            jewelry: Arc::new(JewelryStore::new(db)),
        }
    }
}

impl DataStore for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn jewelry(&self) -> Arc<dyn JewelryRepository> {
        self.jewelry.clone()
    }
}
