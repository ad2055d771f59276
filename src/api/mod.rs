//! HTTP surface: axum handlers, guards, extractors and the router.
//!
//! Every route lives under `/api`; Swagger UI is served at `/swagger-ui`.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
