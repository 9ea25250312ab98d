//! Interaction history configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Interaction history configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Interactions kept per user and operation
    #[serde(default = "default_max_interactions")]
    pub max_interactions: usize,

    /// Topics with no new interaction for this many days are dropped
    #[serde(default = "default_idle_days")]
    pub idle_days: u64,
}

impl HistoryConfig {
    pub fn idle_retention(&self) -> Duration {
        Duration::from_secs(self.idle_days * 24 * 3600)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("history.max_interactions", self.max_interactions as u64, 1, 100)?;
        ValidationError::check_range("history.idle_days", self.idle_days, 1, 365)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_interactions: default_max_interactions(),
            idle_days: default_idle_days(),
        }
    }
}

fn default_max_interactions() -> usize {
    10
}

fn default_idle_days() -> u64 {
    30
}
