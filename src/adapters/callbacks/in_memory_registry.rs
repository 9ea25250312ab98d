//! In-memory callback registry.
//!
//! Pending completions live in a `HashMap` keyed by request id. Each entry
//! holds the sending half of a oneshot channel; settling an entry removes it
//! and sends exactly once, so a second webhook for the same request finds
//! nothing and is a no-op.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};

use crate::domain::foundation::{RequestId, Timestamp};
use crate::domain::orchestration::AIError;
use crate::ports::{
    CallbackError, CallbackRegistry, CallbackResult, PendingCompletion, ResolveOutcome,
};

/// One outstanding asynchronous completion.
#[derive(Debug)]
struct PendingCallback {
    /// Absent when only a callback URL was registered.
    sender: Option<oneshot::Sender<CallbackResult>>,
    callback_url: Option<String>,
    registered_at: Timestamp,
    expires_at: Timestamp,
}

impl PendingCallback {
    fn new(ttl: Duration) -> Self {
        let registered_at = Timestamp::now();
        Self {
            sender: None,
            callback_url: None,
            registered_at,
            expires_at: registered_at.plus(ttl),
        }
    }

    /// Pushes expiry out to `at`; an earlier `at` never shortens it.
    fn extend_to(&mut self, at: Timestamp) {
        self.expires_at = self.expires_at.max(at);
    }

    fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Delivers the result to the waiting caller, if any.
    fn settle(self, request_id: RequestId, result: CallbackResult) {
        if let Some(sender) = self.sender {
            if sender.send(result).is_err() {
                tracing::debug!(request_id = %request_id, "Caller stopped waiting before callback settled");
            }
        }
    }
}

/// In-memory implementation of the CallbackRegistry port.
#[derive(Debug, Default)]
pub struct InMemoryCallbackRegistry {
    pending: RwLock<HashMap<RequestId, PendingCallback>>,
}

impl InMemoryCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback URL registered for a request, if any.
    pub async fn callback_url(&self, request_id: RequestId) -> Option<String> {
        self.pending
            .read()
            .await
            .get(&request_id)
            .and_then(|p| p.callback_url.clone())
    }
}

fn validate_url(url: &str) -> Result<(), CallbackError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| CallbackError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CallbackError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

#[async_trait]
impl CallbackRegistry for InMemoryCallbackRegistry {
    async fn register(
        &self,
        request_id: RequestId,
        ttl: Duration,
    ) -> Result<PendingCompletion, CallbackError> {
        let mut pending = self.pending.write().await;
        let now = Timestamp::now();

        let entry = pending
            .entry(request_id)
            .or_insert_with(|| PendingCallback::new(ttl));

        if entry.sender.as_ref().is_some_and(|s| !s.is_closed()) && !entry.is_expired(now) {
            return Err(CallbackError::AlreadyWaiting(request_id));
        }

        let (tx, rx) = oneshot::channel();
        entry.sender = Some(tx);
        entry.extend_to(now.plus(ttl));

        tracing::debug!(
            request_id = %request_id,
            registered_at = %entry.registered_at.as_datetime(),
            expires_at = %entry.expires_at.as_datetime(),
            "Pending callback registered"
        );
        Ok(PendingCompletion::new(request_id, entry.expires_at, rx))
    }

    async fn attach_url(
        &self,
        request_id: RequestId,
        callback_url: String,
        ttl: Duration,
    ) -> Result<Timestamp, CallbackError> {
        validate_url(&callback_url)?;

        let mut pending = self.pending.write().await;
        let entry = pending
            .entry(request_id)
            .or_insert_with(|| PendingCallback::new(ttl));
        entry.callback_url = Some(callback_url);
        entry.extend_to(Timestamp::now().plus(ttl));

        Ok(entry.expires_at)
    }

    async fn resolve(&self, request_id: RequestId, result: CallbackResult) -> ResolveOutcome {
        let Some(entry) = self.pending.write().await.remove(&request_id) else {
            return ResolveOutcome::NotFound;
        };

        if entry.is_expired(Timestamp::now()) {
            entry.settle(request_id, Err(AIError::CallbackExpired));
            return ResolveOutcome::NotFound;
        }

        let callback_url = entry.callback_url.clone();
        entry.settle(request_id, result);
        ResolveOutcome::Resolved { callback_url }
    }

    async fn cancel(&self, request_id: RequestId) -> bool {
        self.pending.write().await.remove(&request_id).is_some()
    }

    async fn sweep_expired(&self, now: Timestamp) -> usize {
        let expired: Vec<(RequestId, PendingCallback)> = {
            let mut pending = self.pending.write().await;
            let ids: Vec<RequestId> = pending
                .iter()
                .filter(|(_, p)| p.is_expired(now))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|p| (id, p)))
                .collect()
        };

        let count = expired.len();
        for (request_id, entry) in expired {
            tracing::warn!(request_id = %request_id, "Pending callback expired");
            entry.settle(request_id, Err(AIError::CallbackExpired));
        }
        count
    }

    async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CompletedCallback;
    use crate::domain::orchestration::TokenUsage;

    fn completed(content: &str) -> CallbackResult {
        Ok(CompletedCallback {
            content: content.to_string(),
            model: "gpt-4o".to_string(),
            usage: TokenUsage::zero(),
        })
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn resolve_delivers_to_waiter_once() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        let pending = registry.register(id, HOUR).await.unwrap();

        let outcome = registry.resolve(id, completed("{}")).await;
        assert_eq!(outcome, ResolveOutcome::Resolved { callback_url: None });
        assert_eq!(pending.wait().await, completed("{}"));

        // Duplicate delivery finds nothing
        assert_eq!(registry.resolve(id, completed("{}")).await, ResolveOutcome::NotFound);
    }

    #[tokio::test]
    async fn reject_delivers_error() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        let pending = registry.register(id, HOUR).await.unwrap();

        registry
            .resolve(id, Err(AIError::callback_rejected("overloaded")))
            .await;
        assert_eq!(
            pending.wait().await,
            Err(AIError::callback_rejected("overloaded"))
        );
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let registry = InMemoryCallbackRegistry::new();
        assert_eq!(
            registry.resolve(RequestId::new(), completed("{}")).await,
            ResolveOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn second_waiter_is_rejected() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        let _first = registry.register(id, HOUR).await.unwrap();

        let err = registry.register(id, HOUR).await.unwrap_err();
        assert_eq!(err, CallbackError::AlreadyWaiting(id));
    }

    #[tokio::test]
    async fn sweep_rejects_expired_entries() {
        let registry = InMemoryCallbackRegistry::new();
        let expiring = RequestId::new();
        let alive = RequestId::new();
        let pending = registry.register(expiring, Duration::ZERO).await.unwrap();
        registry.register(alive, HOUR).await.unwrap();

        let swept = registry.sweep_expired(Timestamp::now()).await;

        assert_eq!(swept, 1);
        assert_eq!(registry.pending_count().await, 1);
        assert_eq!(pending.wait().await, Err(AIError::CallbackExpired));
    }

    #[tokio::test]
    async fn resolving_expired_entry_is_not_found() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        let pending = registry.register(id, Duration::ZERO).await.unwrap();

        assert_eq!(registry.resolve(id, completed("{}")).await, ResolveOutcome::NotFound);
        assert_eq!(pending.wait().await, Err(AIError::CallbackExpired));
    }

    #[tokio::test]
    async fn attach_url_before_or_after_register() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();

        registry
            .attach_url(id, "https://app.example.com/hooks/ai".to_string(), HOUR)
            .await
            .unwrap();
        let pending = registry.register(id, HOUR).await.unwrap();
        assert_eq!(
            registry.callback_url(id).await.as_deref(),
            Some("https://app.example.com/hooks/ai")
        );

        let outcome = registry.resolve(id, completed("{}")).await;
        assert_eq!(
            outcome,
            ResolveOutcome::Resolved {
                callback_url: Some("https://app.example.com/hooks/ai".to_string())
            }
        );
        assert!(pending.wait().await.is_ok());
    }

    #[tokio::test]
    async fn shorter_ttl_does_not_cut_expiry() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        let url = "https://app.example.com/hooks/ai".to_string();

        let url_expiry = registry.attach_url(id, url.clone(), HOUR).await.unwrap();
        let pending = registry.register(id, Duration::from_secs(60)).await.unwrap();
        assert_eq!(pending.expires_at, url_expiry);

        let later = registry.attach_url(id, url, Duration::from_secs(60)).await.unwrap();
        assert_eq!(later, url_expiry);

        let swept = registry
            .sweep_expired(Timestamp::now().plus(Duration::from_secs(120)))
            .await;
        assert_eq!(swept, 0);
        assert_eq!(registry.pending_count().await, 1);
    }

    #[tokio::test]
    async fn attach_url_rejects_bad_urls() {
        let registry = InMemoryCallbackRegistry::new();
        for url in ["not a url", "ftp://example.com/x"] {
            let err = registry
                .attach_url(RequestId::new(), url.to_string(), HOUR)
                .await
                .unwrap_err();
            assert!(matches!(err, CallbackError::InvalidUrl(_)));
        }
        assert_eq!(registry.pending_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_removes_entry() {
        let registry = InMemoryCallbackRegistry::new();
        let id = RequestId::new();
        registry.register(id, HOUR).await.unwrap();

        assert!(registry.cancel(id).await);
        assert!(!registry.cancel(id).await);
    }
}
