//! HTTP adapters - REST API implementations.
//!
//! Each surface has its own module with DTOs, handlers and routes;
//! [`app_router`] assembles them with tracing, CORS and timeout layers.

pub mod agents;
pub mod batch;
pub mod error;
mod router;
pub mod webhooks;

pub use agents::{agents_router, AgentsAppState};
pub use batch::{batch_router, BatchAppState, BatchDefaults};
pub use error::{ApiError, ErrorResponse};
pub use router::{app_router, HttpSettings, HttpState};
pub use webhooks::{webhooks_router, WebhooksAppState};
