//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{Page, PaginationMeta, PaginationParams};
pub use response::{Created, MessageResponse};
