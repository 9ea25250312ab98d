//! Batch handlers - Chunked execution and time-based scheduling of batches.

mod orchestrator;
mod scheduler;

pub use orchestrator::{BatchOrchestrator, DEFAULT_MAX_MEMBERS};
pub use scheduler::{BatchScheduler, BatchStats, ScheduleReceipt};
