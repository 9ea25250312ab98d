//! MaintenanceWorker - Periodic housekeeping independent of requests.
//!
//! Each tick:
//! 1. Rejects pending callbacks past their expiration
//! 2. Purges expired cache entries
//! 3. Deletes finished batch jobs past retention
//! 4. Deletes processed webhook records past retention
//! 5. Drops interaction history topics idle past retention
//! 6. Submits scheduled batches that are due
//!
//! A failing step is logged and does not stop the others.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time;

use crate::application::handlers::batch::{BatchOrchestrator, BatchScheduler};
use crate::application::SemanticCache;
use crate::domain::foundation::Timestamp;
use crate::ports::{CallbackRegistry, InteractionHistory, ProcessedWebhookStore};

/// Configuration for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// How often a sweep runs.
    pub interval: Duration,
    /// How long finished batch jobs stay queryable.
    pub batch_retention: Duration,
    /// How long processed webhook ids are remembered.
    pub webhook_retention: Duration,
    /// How long a user's history topic survives without new interactions.
    pub history_idle: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_retention: Duration::from_secs(24 * 3600),
            webhook_retention: Duration::from_secs(7 * 24 * 3600),
            history_idle: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

impl MaintenanceConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_batch_retention(mut self, retention: Duration) -> Self {
        self.batch_retention = retention;
        self
    }

    pub fn with_webhook_retention(mut self, retention: Duration) -> Self {
        self.webhook_retention = retention;
        self
    }

    pub fn with_history_idle(mut self, idle: Duration) -> Self {
        self.history_idle = idle;
        self
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_callbacks: usize,
    pub purged_cache_entries: u64,
    pub purged_batches: u64,
    pub purged_webhook_records: u64,
    pub pruned_histories: usize,
    pub dispatched_batches: usize,
}

impl SweepReport {
    fn is_empty(&self) -> bool {
        *self == SweepReport::default()
    }
}

pub struct MaintenanceWorker {
    callbacks: Arc<dyn CallbackRegistry>,
    cache: Arc<SemanticCache>,
    orchestrator: BatchOrchestrator,
    scheduler: Arc<BatchScheduler>,
    webhook_store: Arc<dyn ProcessedWebhookStore>,
    history: Arc<dyn InteractionHistory>,
    config: MaintenanceConfig,
}

impl MaintenanceWorker {
    pub fn new(
        callbacks: Arc<dyn CallbackRegistry>,
        cache: Arc<SemanticCache>,
        orchestrator: BatchOrchestrator,
        scheduler: Arc<BatchScheduler>,
        webhook_store: Arc<dyn ProcessedWebhookStore>,
        history: Arc<dyn InteractionHistory>,
    ) -> Self {
        Self {
            callbacks,
            cache,
            orchestrator,
            scheduler,
            webhook_store,
            history,
            config: MaintenanceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MaintenanceConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs sweeps until the shutdown signal flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.config.interval.as_secs(), "Maintenance worker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Maintenance worker stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// Runs exactly one sweep.
    pub async fn poll_once(&self) -> SweepReport {
        let now = Timestamp::now();
        let mut report = SweepReport::default();

        report.expired_callbacks = self.callbacks.sweep_expired(now).await;
        report.purged_cache_entries = self.cache.purge_expired().await;

        match self.orchestrator.purge_finished(self.config.batch_retention).await {
            Ok(purged) => report.purged_batches = purged,
            Err(e) => tracing::error!(error = %e, "Failed to purge finished batches"),
        }

        let cutoff = now.minus(self.config.webhook_retention);
        match self.webhook_store.delete_before(cutoff).await {
            Ok(purged) => report.purged_webhook_records = purged,
            Err(e) => tracing::error!(error = %e, "Failed to purge webhook records"),
        }

        report.pruned_histories = self.history.prune_idle(now.minus(self.config.history_idle)).await;

        report.dispatched_batches = self.scheduler.dispatch_due(now).await.len();

        if !report.is_empty() {
            tracing::info!(
                expired_callbacks = report.expired_callbacks,
                purged_cache_entries = report.purged_cache_entries,
                purged_batches = report.purged_batches,
                purged_webhook_records = report.purged_webhook_records,
                pruned_histories = report.pruned_histories,
                dispatched_batches = report.dispatched_batches,
                "Maintenance sweep"
            );
        }
        report
    }
}
