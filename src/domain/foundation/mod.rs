//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait and the
//! validation error vocabulary used across the orchestrator.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{BatchId, EventId, RequestId, ScheduleId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
