//! In-memory interaction history.
//!
//! Keeps a bounded ring of recent interactions per user and operation.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::orchestration::AgentOperation;
use crate::ports::{Interaction, InteractionHistory};

/// Default number of interactions retained per user and operation.
pub const DEFAULT_MAX_INTERACTIONS: usize = 10;

#[derive(Debug)]
pub struct InMemoryInteractionHistory {
    entries: RwLock<HashMap<(UserId, AgentOperation), VecDeque<Interaction>>>,
    max_per_topic: usize,
}

impl Default for InMemoryInteractionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INTERACTIONS)
    }
}

impl InMemoryInteractionHistory {
    pub fn new(max_per_topic: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_per_topic: max_per_topic.max(1),
        }
    }
}

#[async_trait]
impl InteractionHistory for InMemoryInteractionHistory {
    async fn record(&self, user_id: &UserId, interaction: Interaction) {
        let mut entries = self.entries.write().await;
        let ring = entries
            .entry((user_id.clone(), interaction.operation))
            .or_default();
        ring.push_back(interaction);
        while ring.len() > self.max_per_topic {
            ring.pop_front();
        }
    }

    async fn recent(
        &self,
        user_id: &UserId,
        operation: AgentOperation,
        limit: usize,
    ) -> Vec<Interaction> {
        let entries = self.entries.read().await;
        let Some(ring) = entries.get(&(user_id.clone(), operation)) else {
            return Vec::new();
        };
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    async fn prune_idle(&self, cutoff: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, ring| {
            ring.back()
                .is_some_and(|newest| !newest.occurred_at.is_before(&cutoff))
        });
        before - entries.len()
    }
}
