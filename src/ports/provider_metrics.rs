//! ProviderMetricsRecorder port - Interface for recording provider calls.
//!
//! Every upstream call, whether synchronous or completed through a webhook,
//! appends one record. Records are never updated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{RequestId, Timestamp};
use crate::domain::orchestration::TokenUsage;

/// Outcome category of one provider interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Success,
    Failure,
    Timeout,
    /// Usage report without a completion.
    Usage,
}

/// Record of one provider interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetricsRecord {
    /// Provider name (e.g., "openai").
    pub provider: String,
    pub request_id: Option<RequestId>,
    pub status: CallStatus,
    pub usage: TokenUsage,
    pub cost_cents: u32,
    /// Wall-clock latency in milliseconds, when measured locally.
    pub latency_ms: Option<u64>,
    pub recorded_at: Timestamp,
}

impl ProviderMetricsRecord {
    pub fn new(provider: impl Into<String>, request_id: Option<RequestId>, status: CallStatus) -> Self {
        Self {
            provider: provider.into(),
            request_id,
            status,
            usage: TokenUsage::zero(),
            cost_cents: 0,
            latency_ms: None,
            recorded_at: Timestamp::now(),
        }
    }

    /// Attaches usage; cost is taken from the usage estimate.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.cost_cents = usage.estimated_cost_cents;
        self.usage = usage;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(latency.as_millis().min(u64::MAX as u128) as u64);
        self
    }
}

/// Aggregate over recorded calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub total_tokens: u64,
    pub total_cost_cents: u64,
}

/// Port for recording provider call metrics.
#[async_trait]
pub trait ProviderMetricsRecorder: Send + Sync {
    /// Appends a record.
    async fn record(&self, record: ProviderMetricsRecord);

    /// Summary across all providers, or one provider when given.
    async fn summary(&self, provider: Option<&str>) -> MetricsSummary;
}
