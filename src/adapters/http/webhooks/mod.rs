//! HTTP adapter for webhook endpoints.
//!
//! - `POST /api/webhooks/{openai,anthropic,custom}` - Signed provider events
//! - `POST /api/webhooks/callbacks` - Register a callback URL
//! - `POST /api/webhooks/callbacks/:request_id` - Signed result for one request

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::WebhooksAppState;
pub use routes::webhooks_router;
