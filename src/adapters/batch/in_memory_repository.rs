//! In-memory batch job repository.
//!
//! Job state is process-local: a restart forgets accepted batches.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::batch::BatchJob;
use crate::domain::foundation::{BatchId, Timestamp};
use crate::domain::orchestration::OrchestratorError;
use crate::ports::{BatchCounts, BatchJobRepository, JobMutation};

#[derive(Debug, Default)]
pub struct InMemoryBatchJobRepository {
    jobs: RwLock<HashMap<BatchId, BatchJob>>,
}

impl InMemoryBatchJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchJobRepository for InMemoryBatchJobRepository {
    async fn insert(&self, job: BatchJob) -> Result<(), OrchestratorError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id()) {
            return Err(OrchestratorError::conflict(format!(
                "batch {} already exists",
                job.id()
            )));
        }
        jobs.insert(job.id(), job);
        Ok(())
    }

    async fn find(&self, id: BatchId) -> Result<Option<BatchJob>, OrchestratorError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: BatchId,
        mutate: JobMutation,
    ) -> Result<BatchJob, OrchestratorError> {
        let mut jobs = self.jobs.write().await;
        let current = jobs
            .get(&id)
            .ok_or_else(|| OrchestratorError::not_found("batch", id))?;

        // Mutate a copy so a rejected change leaves the stored job untouched
        let mut next = current.clone();
        mutate(&mut next)?;
        jobs.insert(id, next.clone());
        Ok(next)
    }

    async fn counts(&self) -> Result<BatchCounts, OrchestratorError> {
        let jobs = self.jobs.read().await;
        let mut counts = BatchCounts::default();
        for job in jobs.values() {
            counts.add(job.status());
        }
        Ok(counts)
    }

    async fn delete_finished_before(&self, cutoff: Timestamp) -> Result<u64, OrchestratorError> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at() {
            Some(finished_at) => !finished_at.is_before(&cutoff),
            None => true,
        });
        Ok((before - jobs.len()) as u64)
    }
}
