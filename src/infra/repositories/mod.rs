//! Repository layer - Data access abstraction
//!
//! Repositories hide SeaORM behind traits so services can be tested
//! against mocks.

pub(crate) mod entities;
mod jewelry_repository;
mod user_repository;

pub use jewelry_repository::{catalog_condition, JewelryRepository, JewelryStore, StatGroup};
pub use user_repository::{UserRepository, UserStore};

#[cfg(test)]
pub use jewelry_repository::MockJewelryRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
