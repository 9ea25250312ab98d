//! Batch job lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Status of a batch job.
///
/// `Accepted -> Processing -> {Completed | Failed | Cancelled}`. A job may
/// also be cancelled or failed before processing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Accepted,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Accepted => "accepted",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    /// True while the job still holds or may hold in-flight work.
    pub fn is_active(&self) -> bool {
        matches!(self, BatchStatus::Accepted | BatchStatus::Processing)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for BatchStatus {
    fn next_states(&self) -> &'static [Self] {
        use BatchStatus::*;
        match self {
            Accepted => &[Processing, Failed, Cancelled],
            Processing => &[Completed, Failed, Cancelled],
            Completed | Failed | Cancelled => &[],
        }
    }
}
