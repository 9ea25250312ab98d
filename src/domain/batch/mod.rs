//! Batch module - Bulk submission of agent work.
//!
//! - `BatchMember` - one submitted unit, resolved into an `AgentInvocation`
//! - `BatchOptions` - parallelism, fail-fast and deadline settings
//! - `BatchJob` - the tracked job with progress and per-member results
//! - `ScheduledBatch` - members queued until their scheduled time

mod job;
mod member;
mod options;
mod schedule;
mod status;

pub use job::{BatchJob, MemberOutcome, MemberResult};
pub use member::{AgentExecution, AgentInvocation, BatchMember};
pub use options::{BatchOptions, DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
pub use schedule::ScheduledBatch;
pub use status::BatchStatus;
