//! BatchJobRepository port - Storage of batch jobs.

use async_trait::async_trait;

use crate::domain::batch::{BatchJob, BatchStatus};
use crate::domain::foundation::{BatchId, Timestamp};
use crate::domain::orchestration::OrchestratorError;

/// Job counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    /// Accepted or processing.
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchCounts {
    pub fn add(&mut self, status: BatchStatus) {
        match status {
            BatchStatus::Accepted | BatchStatus::Processing => self.active += 1,
            BatchStatus::Completed => self.completed += 1,
            BatchStatus::Failed => self.failed += 1,
            BatchStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// A change applied to one stored job under the store's lock.
pub type JobMutation =
    Box<dyn for<'j> FnOnce(&'j mut BatchJob) -> Result<(), OrchestratorError> + Send>;

/// Port for batch job persistence.
///
/// `update` applies `mutate` under the store's lock so concurrent runners
/// and cancel requests see a consistent job.
#[async_trait]
pub trait BatchJobRepository: Send + Sync {
    async fn insert(&self, job: BatchJob) -> Result<(), OrchestratorError>;

    async fn find(&self, id: BatchId) -> Result<Option<BatchJob>, OrchestratorError>;

    /// Applies `mutate` to the stored job and returns the updated copy.
    async fn update(
        &self,
        id: BatchId,
        mutate: JobMutation,
    ) -> Result<BatchJob, OrchestratorError>;

    async fn counts(&self) -> Result<BatchCounts, OrchestratorError>;

    /// Removes terminal jobs finished before `cutoff`. Returns the count.
    async fn delete_finished_before(&self, cutoff: Timestamp) -> Result<u64, OrchestratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_group_active_states() {
        let mut counts = BatchCounts::default();
        counts.add(BatchStatus::Accepted);
        counts.add(BatchStatus::Processing);
        counts.add(BatchStatus::Cancelled);
        assert_eq!(counts.active, 2);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.completed, 0);
    }
}
