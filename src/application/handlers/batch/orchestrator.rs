//! BatchOrchestrator - Runs batches of agent invocations in bounded chunks.
//!
//! `submit` stores the job and returns its id immediately; a spawned runner
//! drives it to a terminal state. Parallel jobs dispatch `max_concurrency`
//! members at a time and await the whole chunk before the next one, so no
//! more than `max_concurrency` members are ever in flight.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::batch::{BatchJob, BatchMember, BatchOptions, MemberResult};
use crate::domain::foundation::{BatchId, Timestamp, ValidationError};
use crate::domain::orchestration::OrchestratorError;
use crate::ports::{AgentExecutor, BatchCounts, BatchJobRepository, JobMutation};

/// Largest batch accepted by default.
pub const DEFAULT_MAX_MEMBERS: usize = 50;

#[derive(Clone)]
pub struct BatchOrchestrator {
    repository: Arc<dyn BatchJobRepository>,
    executor: Arc<dyn AgentExecutor>,
    max_members: usize,
}

impl BatchOrchestrator {
    pub fn new(repository: Arc<dyn BatchJobRepository>, executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            repository,
            executor,
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }

    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members.max(1);
        self
    }

    pub fn max_members(&self) -> usize {
        self.max_members
    }

    /// Checks the member count against the configured limit.
    pub fn validate_size(&self, members: &[BatchMember]) -> Result<(), ValidationError> {
        if members.is_empty() {
            return Err(ValidationError::empty_field("members"));
        }
        if members.len() > self.max_members {
            return Err(ValidationError::too_many("members", self.max_members, members.len()));
        }
        Ok(())
    }

    /// Accepts a batch and starts processing it in the background.
    pub async fn submit(
        &self,
        members: Vec<BatchMember>,
        options: BatchOptions,
    ) -> Result<BatchId, OrchestratorError> {
        self.validate_size(&members)?;
        let job = BatchJob::new(members, options)?;
        let batch_id = job.id();
        let total = job.total();

        self.repository.insert(job).await?;
        tracing::info!(batch_id = %batch_id, total, "Batch accepted");

        let runner = self.clone();
        tokio::spawn(async move { runner.process(batch_id).await });

        Ok(batch_id)
    }

    pub async fn status(&self, batch_id: BatchId) -> Result<BatchJob, OrchestratorError> {
        self.repository
            .find(batch_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("batch", batch_id))
    }

    /// Cancels an active batch. Members already running finish, but their
    /// results are discarded and reported as skipped.
    pub async fn cancel(&self, batch_id: BatchId) -> Result<BatchJob, OrchestratorError> {
        let job = self
            .repository
            .update(batch_id, Box::new(|job: &mut BatchJob| job.cancel()))
            .await?;
        tracing::info!(batch_id = %batch_id, completed = job.completed_count(), "Batch cancelled");
        Ok(job)
    }

    pub async fn counts(&self) -> Result<BatchCounts, OrchestratorError> {
        self.repository.counts().await
    }

    /// Deletes terminal jobs that finished more than `retention` ago.
    pub async fn purge_finished(&self, retention: Duration) -> Result<u64, OrchestratorError> {
        let cutoff = Timestamp::now().minus(retention);
        self.repository.delete_finished_before(cutoff).await
    }

    /// Drives one accepted job to a terminal state.
    pub async fn process(&self, batch_id: BatchId) {
        if let Err(e) = self.run(batch_id).await {
            tracing::error!(batch_id = %batch_id, error = %e, "Batch processing aborted");
            let reason = e.to_string();
            let failed = self
                .repository
                .update(batch_id, Box::new(move |job: &mut BatchJob| job.fail(reason)))
                .await;
            if let Err(e) = failed {
                tracing::debug!(batch_id = %batch_id, error = %e, "Batch already terminal");
            }
        }
    }

    async fn run(&self, batch_id: BatchId) -> Result<(), OrchestratorError> {
        // 1. Move to processing; a job cancelled before it started stays cancelled
        let started = self
            .repository
            .update(batch_id, Box::new(|job: &mut BatchJob| job.start()))
            .await;
        let job = match started {
            Ok(job) => job,
            Err(OrchestratorError::Conflict(reason)) => {
                tracing::info!(batch_id = %batch_id, reason = %reason, "Batch not started");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let options = job.options().clone();
        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
        let members: Vec<(usize, BatchMember)> = job.members().iter().cloned().enumerate().collect();

        tracing::info!(
            batch_id = %batch_id,
            total = members.len(),
            parallel = options.parallel,
            chunk_size = options.chunk_size(),
            "Batch processing started"
        );

        // 2. Dispatch chunk by chunk
        for chunk in members.chunks(options.chunk_size()) {
            let current = self.status(batch_id).await?;
            if current.is_terminal() {
                tracing::info!(batch_id = %batch_id, status = %current.status(), "Batch stopped");
                return Ok(());
            }

            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => Some(remaining),
                    _ => return self.time_out(batch_id, &options).await,
                },
                None => None,
            };

            let size = chunk.len();
            self.repository
                .update(batch_id, Box::new(move |job: &mut BatchJob| {
                    job.record_chunk(size);
                    Ok(())
                }))
                .await?;

            let dispatch = join_all(
                chunk
                    .iter()
                    .map(|(index, member)| self.run_member(batch_id, *index, member)),
            );
            let results = match remaining {
                Some(remaining) => match tokio::time::timeout(remaining, dispatch).await {
                    Ok(results) => results,
                    Err(_) => return self.time_out(batch_id, &options).await,
                },
                None => dispatch.await,
            };

            // 3. Record the chunk; late results of a cancelled job are dropped
            let first_failure = results
                .iter()
                .find(|r| r.is_failure())
                .map(|r| format!("member {} failed", r.index));
            let job = self
                .repository
                .update(batch_id, Box::new(move |job: &mut BatchJob| {
                    for result in results {
                        job.record_result(result);
                    }
                    Ok(())
                }))
                .await?;

            tracing::debug!(
                batch_id = %batch_id,
                progress = job.progress(),
                completed = job.completed_count(),
                "Chunk finished"
            );

            if options.fail_fast {
                if let Some(reason) = first_failure {
                    tracing::warn!(batch_id = %batch_id, reason = %reason, "Failing fast");
                    return self
                        .finish(batch_id, Box::new(move |job: &mut BatchJob| job.fail(reason)))
                        .await;
                }
            }
        }

        // 4. Complete
        self.finish(batch_id, Box::new(|job: &mut BatchJob| job.complete())).await
    }

    async fn run_member(&self, batch_id: BatchId, index: usize, member: &BatchMember) -> MemberResult {
        let invocation = match member.resolve() {
            Ok(invocation) => invocation,
            Err(e) => {
                let error = OrchestratorError::from(e);
                tracing::warn!(batch_id = %batch_id, index, error = %error, "Batch member rejected");
                return MemberResult::failed(index, member, &error);
            }
        };

        let operation = invocation.operation;
        match self.executor.execute(invocation).await {
            Ok(execution) => MemberResult::succeeded(index, member, execution),
            Err(error) => {
                tracing::warn!(
                    batch_id = %batch_id,
                    index,
                    operation = %operation,
                    error = %error,
                    "Batch member failed"
                );
                MemberResult::failed(index, member, &error)
            }
        }
    }

    async fn time_out(&self, batch_id: BatchId, options: &BatchOptions) -> Result<(), OrchestratorError> {
        let secs = options.timeout.map(|t| t.as_secs()).unwrap_or_default();
        tracing::warn!(batch_id = %batch_id, timeout_secs = secs, "Batch timed out");
        let reason = format!("timed out after {}s", secs);
        self.finish(batch_id, Box::new(move |job: &mut BatchJob| job.fail(reason))).await
    }

    /// Applies a terminal transition. A job cancelled meanwhile keeps its state.
    async fn finish(
        &self,
        batch_id: BatchId,
        transition: JobMutation,
    ) -> Result<(), OrchestratorError> {
        match self.repository.update(batch_id, transition).await {
            Ok(job) => {
                tracing::info!(
                    batch_id = %batch_id,
                    status = %job.status(),
                    completed = job.completed_count(),
                    failed = job.failed_count(),
                    "Batch finished"
                );
                Ok(())
            }
            Err(OrchestratorError::Conflict(reason)) => {
                tracing::debug!(batch_id = %batch_id, reason = %reason, "Batch already terminal");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
