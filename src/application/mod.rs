//! Application layer - Handlers, the semantic cache and background work.
//!
//! Handlers orchestrate domain operations and coordinate between ports.

pub mod handlers;
mod maintenance;
mod semantic_cache;

pub use maintenance::{MaintenanceConfig, MaintenanceWorker, SweepReport};
pub use semantic_cache::{SemanticCache, DEFAULT_CACHE_TTL};
