//! Batch orchestration configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Batch orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Largest accepted batch
    #[serde(default = "default_max_members")]
    pub max_members: usize,

    /// Chunk size when the request does not set one
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,

    /// Upper bound for a requested chunk size
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Job deadline in seconds when the request does not set one
    pub default_timeout_secs: Option<u64>,

    /// How long finished jobs stay queryable
    #[serde(default = "default_retention")]
    pub retention_minutes: u64,
}

impl BatchConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs.map(Duration::from_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_minutes * 60)
    }

    /// Validate batch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("batch.max_members", self.max_members as u64, 1, 50)?;
        ValidationError::check_range("batch.max_concurrency", self.max_concurrency as u64, 1, 10)?;
        ValidationError::check_range(
            "batch.default_concurrency",
            self.default_concurrency as u64,
            1,
            self.max_concurrency as u64,
        )?;
        if let Some(timeout) = self.default_timeout_secs {
            ValidationError::check_range("batch.default_timeout_secs", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
            default_concurrency: default_concurrency(),
            max_concurrency: default_max_concurrency(),
            default_timeout_secs: None,
            retention_minutes: default_retention(),
        }
    }
}

fn default_max_members() -> usize {
    50
}

fn default_concurrency() -> usize {
    5
}

fn default_max_concurrency() -> usize {
    10
}

fn default_retention() -> u64 {
    24 * 60
}
