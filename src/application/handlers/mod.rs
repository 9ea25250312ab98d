//! Application handlers.
//!
//! One module per surface: agent operations, batches and webhooks.

pub mod agents;
pub mod batch;
pub mod webhook;
