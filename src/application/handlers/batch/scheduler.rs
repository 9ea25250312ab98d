//! BatchScheduler - Holds members until their scheduled time.
//!
//! Each queue entry is the set of members from one request sharing a run
//! time. The queue is ordered by run time; ties keep arrival order. The
//! maintenance worker calls [`BatchScheduler::dispatch_due`] on every tick.

use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::batch::{BatchMember, BatchOptions, ScheduledBatch};
use crate::domain::foundation::{BatchId, ScheduleId, Timestamp, ValidationError};
use crate::domain::orchestration::OrchestratorError;

use super::BatchOrchestrator;

/// Receipt for a scheduled batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReceipt {
    pub schedule_id: ScheduleId,
    /// 1-based queue position of the earliest group at the time of scheduling.
    pub queue_position: usize,
    /// Number of members scheduled.
    pub scheduled: usize,
    /// Distinct run times, each submitted as its own batch.
    pub batches: usize,
    /// Earliest run time in the request.
    pub run_at: Timestamp,
}

/// Job counts by state plus the scheduled queue length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub queued: usize,
}

pub struct BatchScheduler {
    orchestrator: BatchOrchestrator,
    queue: Mutex<Vec<ScheduledBatch>>,
}

impl BatchScheduler {
    pub fn new(orchestrator: BatchOrchestrator) -> Self {
        Self {
            orchestrator,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Queues each member under its own `scheduled_at`. Members sharing a
    /// time are submitted together as one batch.
    pub async fn schedule(
        &self,
        members: Vec<BatchMember>,
        options: BatchOptions,
    ) -> Result<ScheduleReceipt, OrchestratorError> {
        self.orchestrator.validate_size(&members)?;

        let count = members.len();
        let groups = ScheduledBatch::group(members, options, Timestamp::now());
        let batches = groups.len();
        let (schedule_id, run_at) = match groups.first() {
            Some(first) => (first.id, first.run_at),
            None => return Err(ValidationError::empty_field("members").into()),
        };

        let mut queue = self.queue.lock().await;
        let mut first_position = None;
        for group in groups {
            let position = queue.partition_point(|queued| !queued.run_at.is_after(&group.run_at));
            first_position.get_or_insert(position);
            queue.insert(position, group);
        }
        let queue_position = first_position.unwrap_or_default() + 1;

        tracing::info!(
            schedule_id = %schedule_id,
            members = count,
            batches,
            run_at = %run_at.as_datetime(),
            queue_position,
            "Batch scheduled"
        );

        Ok(ScheduleReceipt {
            schedule_id,
            queue_position,
            scheduled: count,
            batches,
            run_at,
        })
    }

    /// Submits every queued batch whose run time has arrived.
    pub async fn dispatch_due(&self, now: Timestamp) -> Vec<BatchId> {
        let due: Vec<ScheduledBatch> = {
            let mut queue = self.queue.lock().await;
            let split = queue.partition_point(|queued| queued.is_due(now));
            queue.drain(..split).collect()
        };

        let mut submitted = Vec::with_capacity(due.len());
        for scheduled in due {
            let schedule_id = scheduled.id;
            match self.orchestrator.submit(scheduled.members, scheduled.options).await {
                Ok(batch_id) => {
                    tracing::info!(schedule_id = %schedule_id, batch_id = %batch_id, "Scheduled batch submitted");
                    submitted.push(batch_id);
                }
                Err(e) => {
                    tracing::error!(schedule_id = %schedule_id, error = %e, "Scheduled batch rejected");
                }
            }
        }
        submitted
    }

    pub async fn queued(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn stats(&self) -> Result<BatchStats, OrchestratorError> {
        let counts = self.orchestrator.counts().await?;
        Ok(BatchStats {
            active: counts.active,
            completed: counts.completed,
            failed: counts.failed,
            cancelled: counts.cancelled,
            queued: self.queued().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::batch::InMemoryBatchJobRepository;
    use crate::domain::batch::{AgentExecution, AgentInvocation};
    use crate::domain::foundation::RequestId;
    use crate::domain::orchestration::{OutcomeSource, TokenUsage};
    use crate::ports::AgentExecutor;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct EchoExecutor;

    #[async_trait]
    impl AgentExecutor for EchoExecutor {
        async fn execute(&self, invocation: AgentInvocation) -> Result<AgentExecution, OrchestratorError> {
            Ok(AgentExecution {
                request_id: RequestId::new(),
                output: invocation.input,
                source: OutcomeSource::Provider,
                usage: TokenUsage::zero(),
            })
        }
    }

    fn scheduler() -> BatchScheduler {
        let orchestrator = BatchOrchestrator::new(
            Arc::new(InMemoryBatchJobRepository::new()),
            Arc::new(EchoExecutor),
        );
        BatchScheduler::new(orchestrator)
    }

    fn member_at(at: Timestamp) -> BatchMember {
        BatchMember::new("daily_insight", "user-1", json!({"focus_area": "trust", "date": "2026-03-01"}))
            .scheduled_for(at)
    }

    #[tokio::test]
    async fn queue_is_ordered_by_run_time() {
        let scheduler = scheduler();
        let now = Timestamp::now();

        let late = scheduler
            .schedule(vec![member_at(now.plus(Duration::from_secs(600)))], BatchOptions::new())
            .await
            .unwrap();
        let early = scheduler
            .schedule(vec![member_at(now.plus(Duration::from_secs(60)))], BatchOptions::new())
            .await
            .unwrap();

        assert_eq!(late.queue_position, 1);
        assert_eq!(early.queue_position, 1);
        assert_eq!(early.scheduled, 1);
        assert_eq!(scheduler.queued().await, 2);
    }

    #[tokio::test]
    async fn dispatches_only_due_batches() {
        let scheduler = scheduler();
        let now = Timestamp::now();
        scheduler
            .schedule(vec![member_at(now.minus(Duration::from_secs(1)))], BatchOptions::new())
            .await
            .unwrap();
        scheduler
            .schedule(vec![member_at(now.plus(Duration::from_secs(3600)))], BatchOptions::new())
            .await
            .unwrap();

        let submitted = scheduler.dispatch_due(now).await;

        assert_eq!(submitted.len(), 1);
        assert_eq!(scheduler.queued().await, 1);
        let stats = scheduler.stats().await.unwrap();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.active + stats.completed, 1);
    }

    #[tokio::test]
    async fn members_of_one_request_run_at_their_own_times() {
        let scheduler = scheduler();
        let now = Timestamp::now();
        let members = vec![
            member_at(now.minus(Duration::from_secs(1))),
            member_at(now.plus(Duration::from_secs(7 * 24 * 3600))),
        ];

        let receipt = scheduler.schedule(members, BatchOptions::new()).await.unwrap();
        assert_eq!(receipt.scheduled, 2);
        assert_eq!(receipt.batches, 2);

        let submitted = scheduler.dispatch_due(now).await;

        assert_eq!(submitted.len(), 1);
        let job = scheduler.orchestrator.status(submitted[0]).await.unwrap();
        assert_eq!(job.members().len(), 1);
        assert_eq!(scheduler.queued().await, 1);
    }

    #[tokio::test]
    async fn queue_position_counts_earlier_entries() {
        let scheduler = scheduler();
        let now = Timestamp::now();
        scheduler
            .schedule(vec![member_at(now.plus(Duration::from_secs(60)))], BatchOptions::new())
            .await
            .unwrap();

        let receipt = scheduler
            .schedule(
                vec![
                    member_at(now.plus(Duration::from_secs(600))),
                    member_at(now.plus(Duration::from_secs(120))),
                ],
                BatchOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(receipt.queue_position, 2);
        assert_eq!(receipt.run_at, now.plus(Duration::from_secs(120)));
        assert_eq!(scheduler.queued().await, 3);
    }

    #[tokio::test]
    async fn rejects_oversized_schedule() {
        let scheduler = scheduler();
        let members = (0..51).map(|_| member_at(Timestamp::now())).collect();
        let err = scheduler.schedule(members, BatchOptions::new()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }
}
