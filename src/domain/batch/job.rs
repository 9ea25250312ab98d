//! The batch job aggregate.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{BatchId, RequestId, StateMachine, Timestamp, ValidationError};
use crate::domain::orchestration::{OrchestratorError, OutcomeSource};

use super::{AgentExecution, BatchMember, BatchOptions, BatchStatus};

/// Final state of one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MemberOutcome {
    Succeeded {
        request_id: RequestId,
        output: Value,
        source: OutcomeSource,
    },
    Failed {
        error: String,
        code: String,
    },
    Skipped {
        reason: String,
    },
}

/// Per-member result, keyed by submission index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberResult {
    pub index: usize,
    pub agent_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(flatten)]
    pub outcome: MemberOutcome,
}

impl MemberResult {
    pub fn succeeded(index: usize, member: &BatchMember, execution: AgentExecution) -> Self {
        Self::with_outcome(
            index,
            member,
            MemberOutcome::Succeeded {
                request_id: execution.request_id,
                output: execution.output,
                source: execution.source,
            },
        )
    }

    pub fn failed(index: usize, member: &BatchMember, error: &OrchestratorError) -> Self {
        Self::with_outcome(
            index,
            member,
            MemberOutcome::Failed {
                error: error.to_string(),
                code: error.code().to_string(),
            },
        )
    }

    pub fn skipped(index: usize, member: &BatchMember, reason: impl Into<String>) -> Self {
        Self::with_outcome(
            index,
            member,
            MemberOutcome::Skipped {
                reason: reason.into(),
            },
        )
    }

    fn with_outcome(index: usize, member: &BatchMember, outcome: MemberOutcome) -> Self {
        Self {
            index,
            agent_type: member.agent_type.clone(),
            operation: member.operation.clone(),
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, MemberOutcome::Failed { .. })
    }
}

/// A tracked set of members sharing one set of options.
///
/// Invariants:
/// - `progress` never decreases and stays within 0..=100
/// - once terminal, the status never changes and results are frozen
/// - a terminal job holds exactly one result per member
#[derive(Debug, Clone)]
pub struct BatchJob {
    id: BatchId,
    members: Vec<BatchMember>,
    options: BatchOptions,
    status: BatchStatus,
    progress: u8,
    completed_count: usize,
    chunk_sizes: Vec<usize>,
    results: Vec<Option<MemberResult>>,
    error: Option<String>,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
}

impl BatchJob {
    /// Creates an accepted job. At least one member is required.
    pub fn new(members: Vec<BatchMember>, options: BatchOptions) -> Result<Self, ValidationError> {
        if members.is_empty() {
            return Err(ValidationError::empty_field("members"));
        }
        let total = members.len();
        Ok(Self {
            id: BatchId::new(),
            members,
            options,
            status: BatchStatus::Accepted,
            progress: 0,
            completed_count: 0,
            chunk_sizes: Vec::new(),
            results: vec![None; total],
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            finished_at: None,
        })
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn members(&self) -> &[BatchMember] {
        &self.members
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn total(&self) -> usize {
        self.members.len()
    }

    /// Sizes of the chunks dispatched so far, in order.
    pub fn chunk_sizes(&self) -> &[usize] {
        &self.chunk_sizes
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Recorded results in submission order.
    pub fn results(&self) -> Vec<MemberResult> {
        self.results.iter().flatten().cloned().collect()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().flatten().filter(|r| r.is_failure()).count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════════

    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        self.transition(BatchStatus::Processing)?;
        self.started_at = Some(Timestamp::now());
        Ok(())
    }

    /// Notes that a chunk of `size` members was dispatched.
    pub fn record_chunk(&mut self, size: usize) {
        if self.status == BatchStatus::Processing && size > 0 {
            self.chunk_sizes.push(size);
        }
    }

    /// Stores one member result and advances progress.
    ///
    /// Returns false when the result was discarded: the job is no longer
    /// active, the index is unknown, or the member already has a result.
    pub fn record_result(&mut self, result: MemberResult) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let slot = match self.results.get_mut(result.index) {
            Some(slot) if slot.is_none() => slot,
            _ => return false,
        };
        *slot = Some(result);
        self.completed_count += 1;

        let progress = (self.completed_count * 100 / self.total()).min(100) as u8;
        self.progress = self.progress.max(progress);
        true
    }

    pub fn complete(&mut self) -> Result<(), OrchestratorError> {
        self.transition(BatchStatus::Completed)?;
        self.finish("not dispatched");
        Ok(())
    }

    /// Marks the job failed; members without a result are skipped.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), OrchestratorError> {
        let reason = reason.into();
        self.transition(BatchStatus::Failed)?;
        self.finish(&format!("batch failed: {}", reason));
        self.error = Some(reason);
        Ok(())
    }

    /// Cancels the job. In-flight results arriving later are discarded.
    pub fn cancel(&mut self) -> Result<(), OrchestratorError> {
        self.transition(BatchStatus::Cancelled)?;
        self.finish("batch cancelled");
        Ok(())
    }

    fn transition(&mut self, target: BatchStatus) -> Result<(), OrchestratorError> {
        let next = self.status.transition_to(target).map_err(|_| {
            OrchestratorError::conflict(format!(
                "batch {} is {} and cannot become {}",
                self.id, self.status, target
            ))
        })?;
        self.status = next;
        Ok(())
    }

    fn finish(&mut self, skip_reason: &str) {
        for (index, slot) in self.results.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(MemberResult::skipped(index, &self.members[index], skip_reason));
            }
        }
        self.finished_at = Some(Timestamp::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orchestration::TokenUsage;
    use serde_json::json;

    fn members(n: usize) -> Vec<BatchMember> {
        (0..n)
            .map(|i| BatchMember::new("daily_insight", format!("user-{}", i), json!({})))
            .collect()
    }

    fn success(job: &BatchJob, index: usize) -> MemberResult {
        success_for(&job.members()[index], index)
    }

    fn success_for(member: &BatchMember, index: usize) -> MemberResult {
        MemberResult::succeeded(
            index,
            member,
            AgentExecution {
                request_id: RequestId::new(),
                output: json!({"ok": true}),
                source: OutcomeSource::Provider,
                usage: TokenUsage::zero(),
            },
        )
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(BatchJob::new(vec![], BatchOptions::default()).is_err());
    }

    #[test]
    fn progress_tracks_completed_members() {
        let mut job = BatchJob::new(members(3), BatchOptions::default()).unwrap();
        job.start().unwrap();
        assert!(job.record_result(success(&job, 0)));
        assert_eq!(job.progress(), 33);
        assert!(job.record_result(success(&job, 1)));
        assert!(job.record_result(success(&job, 2)));
        assert_eq!(job.progress(), 100);
        assert_eq!(job.completed_count(), 3);
        job.complete().unwrap();
        assert_eq!(job.results().len(), 3);
    }

    #[test]
    fn duplicate_result_is_ignored() {
        let mut job = BatchJob::new(members(2), BatchOptions::default()).unwrap();
        job.start().unwrap();
        assert!(job.record_result(success(&job, 0)));
        assert!(!job.record_result(success(&job, 0)));
        assert_eq!(job.completed_count(), 1);
    }

    #[test]
    fn result_for_unknown_index_is_ignored() {
        let mut job = BatchJob::new(members(2), BatchOptions::default()).unwrap();
        job.start().unwrap();
        let stranger = BatchMember::new("daily_insight", "user-7", json!({}));
        assert!(!job.record_result(success_for(&stranger, 7)));
        assert_eq!(job.completed_count(), 0);
        assert_eq!(job.progress(), 0);
    }

    #[test]
    fn cancel_freezes_results() {
        let mut job = BatchJob::new(members(4), BatchOptions::default()).unwrap();
        job.start().unwrap();
        job.record_result(success(&job, 0));
        job.cancel().unwrap();

        let late = success(&job, 1);
        assert!(!job.record_result(late));
        assert_eq!(job.status(), BatchStatus::Cancelled);
        let results = job.results();
        assert_eq!(results.len(), 4);
        assert!(matches!(results[1].outcome, MemberOutcome::Skipped { .. }));
    }

    #[test]
    fn terminal_job_rejects_transitions() {
        let mut job = BatchJob::new(members(1), BatchOptions::default()).unwrap();
        job.start().unwrap();
        job.record_result(success(&job, 0));
        job.complete().unwrap();
        assert!(matches!(job.cancel(), Err(OrchestratorError::Conflict(_))));
        assert!(matches!(job.fail("late"), Err(OrchestratorError::Conflict(_))));
    }

    #[test]
    fn fail_skips_remaining_members() {
        let mut job = BatchJob::new(members(3), BatchOptions::default()).unwrap();
        job.start().unwrap();
        let member = job.members()[0].clone();
        job.record_result(MemberResult::failed(
            0,
            &member,
            &OrchestratorError::internal("boom"),
        ));
        job.fail("member 0 failed").unwrap();
        assert_eq!(job.failed_count(), 1);
        assert_eq!(job.results().len(), 3);
        assert_eq!(job.error(), Some("member 0 failed"));
    }

    #[test]
    fn chunks_recorded_only_while_processing() {
        let mut job = BatchJob::new(members(2), BatchOptions::default()).unwrap();
        job.record_chunk(2);
        assert!(job.chunk_sizes().is_empty());
        job.start().unwrap();
        job.record_chunk(2);
        assert_eq!(job.chunk_sizes(), &[2]);
    }

    #[test]
    fn member_result_serializes_flat() {
        let member = BatchMember::new("daily_insight", "u", json!({}));
        let value = serde_json::to_value(MemberResult::skipped(3, &member, "why")).unwrap();
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["index"], 3);
        assert_eq!(value["reason"], "why");
    }
}
