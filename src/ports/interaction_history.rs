//! InteractionHistory port - Recent per-user, per-topic interactions.
//!
//! Agent handlers read a bounded slice of history as prompt context and
//! append each validated output. History never feeds the cache fingerprint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RequestId, Timestamp, UserId};
use crate::domain::orchestration::AgentOperation;

/// One past exchange with an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub request_id: RequestId,
    pub operation: AgentOperation,
    /// Short text shown to the model, not the full output.
    pub summary: String,
    pub occurred_at: Timestamp,
}

impl Interaction {
    pub fn new(request_id: RequestId, operation: AgentOperation, summary: impl Into<String>) -> Self {
        Self {
            request_id,
            operation,
            summary: summary.into(),
            occurred_at: Timestamp::now(),
        }
    }
}

/// Port for interaction history.
#[async_trait]
pub trait InteractionHistory: Send + Sync {
    /// Appends an interaction for `user_id` under the interaction's operation.
    async fn record(&self, user_id: &UserId, interaction: Interaction);

    /// Most recent interactions for the topic, oldest first, at most `limit`.
    async fn recent(
        &self,
        user_id: &UserId,
        operation: AgentOperation,
        limit: usize,
    ) -> Vec<Interaction>;

    /// Drops every topic whose newest interaction is older than `cutoff`.
    /// Returns the number of topics removed.
    async fn prune_idle(&self, cutoff: Timestamp) -> usize;
}
