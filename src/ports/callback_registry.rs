//! CallbackRegistry port - Pending asynchronous provider completions.
//!
//! When a provider completes asynchronously, the caller parks on a
//! [`PendingCompletion`] keyed by request id. The webhook receiver later
//! resolves or rejects it; the maintenance sweep rejects entries whose
//! expiry passed. Each pending entry settles at most once.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::foundation::{RequestId, Timestamp};
use crate::domain::orchestration::{AIError, TokenUsage};

/// Successful asynchronous completion as delivered by a webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCallback {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// What a pending completion settles with.
pub type CallbackResult = Result<CompletedCallback, AIError>;

/// Receiving half handed to the caller that registered.
#[derive(Debug)]
pub struct PendingCompletion {
    pub request_id: RequestId,
    pub expires_at: Timestamp,
    receiver: oneshot::Receiver<CallbackResult>,
}

impl PendingCompletion {
    pub fn new(
        request_id: RequestId,
        expires_at: Timestamp,
        receiver: oneshot::Receiver<CallbackResult>,
    ) -> Self {
        Self {
            request_id,
            expires_at,
            receiver,
        }
    }

    /// Waits for the webhook. A dropped sender counts as expiry.
    pub async fn wait(self) -> CallbackResult {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(AIError::CallbackExpired),
        }
    }
}

/// Result of settling a pending entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// An entry existed and was settled; forward to `callback_url` if set.
    Resolved { callback_url: Option<String> },
    /// Nothing pending for this request (never registered, expired or already settled).
    NotFound,
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallbackError {
    #[error("a caller is already waiting on request {0}")]
    AlreadyWaiting(RequestId),

    #[error("invalid callback url: {0}")]
    InvalidUrl(String),

    #[error("callback delivery failed: {0}")]
    Delivery(String),
}

/// Port for tracking pending completions.
#[async_trait]
pub trait CallbackRegistry: Send + Sync {
    /// Registers a waiter for `request_id`, expiring after `ttl` unless an
    /// attached URL already holds the entry longer.
    async fn register(
        &self,
        request_id: RequestId,
        ttl: Duration,
    ) -> Result<PendingCompletion, CallbackError>;

    /// Records a URL the settled outcome is forwarded to.
    ///
    /// Creates the entry if no caller registered yet.
    async fn attach_url(
        &self,
        request_id: RequestId,
        callback_url: String,
        ttl: Duration,
    ) -> Result<Timestamp, CallbackError>;

    /// Settles the entry for `request_id`, removing it.
    async fn resolve(&self, request_id: RequestId, result: CallbackResult) -> ResolveOutcome;

    /// Removes the entry without settling it. Returns whether one existed.
    async fn cancel(&self, request_id: RequestId) -> bool;

    /// Rejects and removes every entry expired at `now`. Returns the count.
    async fn sweep_expired(&self, now: Timestamp) -> usize;

    async fn pending_count(&self) -> usize;
}

/// Port for forwarding settled outcomes to a registered callback URL.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(
        &self,
        callback_url: &str,
        request_id: RequestId,
        result: &CallbackResult,
    ) -> Result<(), CallbackError>;
}
