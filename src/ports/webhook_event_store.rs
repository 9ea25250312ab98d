//! ProcessedWebhookStore port - Idempotency tracking for provider webhooks.
//!
//! Providers may deliver the same webhook multiple times due to:
//! - Network timeouts
//! - 5xx responses from our endpoint (triggers redelivery)
//! - Our endpoint returning success but the provider not receiving it
//!
//! The receiver checks this store before dispatching and records every
//! processed event afterwards.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{WebhookError, WebhookEventRecord};

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// `save` must be insert-if-absent so concurrent deliveries of one event
/// cannot both win.
#[async_trait]
pub trait ProcessedWebhookStore: Send + Sync {
    /// Find a previously processed event by its provider event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, WebhookError>;

    /// Insert the record unless one exists for the same event id.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, WebhookError>;

    /// Delete records processed before `timestamp`. Returns the count.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, WebhookError>;
}
