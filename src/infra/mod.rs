//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories
//! - Redis rate limit counters
//! - SMTP mail delivery
//! - Identity provider token verification

pub mod cache;
pub mod db;
pub mod identity;
pub mod mailer;
pub mod persistence;
pub mod repositories;

pub use cache::{Cache, RateLimitStore};
pub use db::{Database, Migrator};
pub use identity::{FirebaseVerifier, IdentityVerifier};
pub use mailer::{mailer_from_config, LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use persistence::{DataStore, Persistence};
pub use repositories::{
    catalog_condition, JewelryRepository, JewelryStore, StatGroup, UserRepository, UserStore,
};

#[cfg(test)]
pub use identity::MockIdentityVerifier;
#[cfg(test)]
pub use mailer::MockMailer;
#[cfg(test)]
pub use persistence::MockDataStore;
#[cfg(test)]
pub use repositories::{MockJewelryRepository, MockUserRepository};
