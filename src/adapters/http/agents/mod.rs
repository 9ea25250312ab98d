//! HTTP adapter for agent endpoints.
//!
//! - `POST /api/agents/:operation` - Run one agent operation synchronously

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AgentsAppState;
pub use routes::agents_router;
