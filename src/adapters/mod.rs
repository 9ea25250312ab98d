//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - provider backends, the provider router and call metrics
//! - `cache` - response cache stores (in-memory, Redis)
//! - `callbacks` - pending completion registry and result forwarding
//! - `batch` - batch job storage
//! - `webhook` - processed webhook event store
//! - `history` - per-user interaction history
//! - `http` - axum routers

pub mod ai;
pub mod batch;
pub mod cache;
pub mod callbacks;
pub mod history;
pub mod http;
pub mod webhook;
