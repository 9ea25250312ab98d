//! In-memory provider metrics recorder.
//!
//! Append-only list of [`ProviderMetricsRecord`]s behind a `Mutex`. Suitable
//! for single-server deployments and tests; records do not survive restarts.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::ports::{CallStatus, MetricsSummary, ProviderMetricsRecord, ProviderMetricsRecorder};

/// In-memory implementation of the ProviderMetricsRecorder port.
#[derive(Debug, Default)]
pub struct InMemoryProviderMetrics {
    records: Mutex<Vec<ProviderMetricsRecord>>,
}

impl InMemoryProviderMetrics {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProviderMetricsRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns all recorded records, oldest first.
    pub fn records(&self) -> Vec<ProviderMetricsRecord> {
        self.lock().clone()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no records exist.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl ProviderMetricsRecorder for InMemoryProviderMetrics {
    async fn record(&self, record: ProviderMetricsRecord) {
        tracing::debug!(
            provider = %record.provider,
            request_id = ?record.request_id,
            status = ?record.status,
            tokens = record.usage.total_tokens,
            cost_cents = record.cost_cents,
            "Provider call recorded"
        );
        self.lock().push(record);
    }

    async fn summary(&self, provider: Option<&str>) -> MetricsSummary {
        let records = self.lock();

        records
            .iter()
            .filter(|r| provider.map_or(true, |p| r.provider == p))
            .fold(MetricsSummary::default(), |mut summary, r| {
                match r.status {
                    CallStatus::Success => {
                        summary.calls += 1;
                        summary.successes += 1;
                    }
                    CallStatus::Failure => {
                        summary.calls += 1;
                        summary.failures += 1;
                    }
                    CallStatus::Timeout => {
                        summary.calls += 1;
                        summary.timeouts += 1;
                    }
                    CallStatus::Usage => {}
                }
                summary.total_tokens += u64::from(r.usage.total_tokens);
                summary.total_cost_cents += u64::from(r.cost_cents);
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orchestration::TokenUsage;

    #[tokio::test]
    async fn records_are_appended() {
        let metrics = InMemoryProviderMetrics::new();
        assert!(metrics.is_empty());

        metrics
            .record(ProviderMetricsRecord::new("openai", None, CallStatus::Success))
            .await;
        metrics
            .record(ProviderMetricsRecord::new("openai", None, CallStatus::Failure))
            .await;

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.records()[1].status, CallStatus::Failure);
    }

    #[tokio::test]
    async fn summary_counts_calls_and_usage() {
        let metrics = InMemoryProviderMetrics::new();
        metrics
            .record(
                ProviderMetricsRecord::new("openai", None, CallStatus::Success)
                    .with_usage(TokenUsage::new(100, 50, 3)),
            )
            .await;
        metrics
            .record(ProviderMetricsRecord::new("openai", None, CallStatus::Timeout))
            .await;
        metrics
            .record(
                ProviderMetricsRecord::new("anthropic", None, CallStatus::Usage)
                    .with_usage(TokenUsage::new(10, 10, 1)),
            )
            .await;

        let all = metrics.summary(None).await;
        assert_eq!(all.calls, 2);
        assert_eq!(all.successes, 1);
        assert_eq!(all.timeouts, 1);
        assert_eq!(all.total_tokens, 170);
        assert_eq!(all.total_cost_cents, 4);

        let anthropic = metrics.summary(Some("anthropic")).await;
        assert_eq!(anthropic.calls, 0);
        assert_eq!(anthropic.total_tokens, 20);
    }
}
