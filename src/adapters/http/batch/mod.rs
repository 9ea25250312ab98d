//! HTTP adapter for batch endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::BatchDefaults;
pub use handlers::BatchAppState;
pub use routes::batch_router;
