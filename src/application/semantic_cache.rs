//! Semantic cache - Fingerprint-keyed reuse of provider responses.
//!
//! Wraps a [`ResponseCacheStore`] and owns the TTL policy. Store failures
//! never reach the caller: reads degrade to a miss and writes to a no-op.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::orchestration::{AgentRequest, AgentResponse};
use crate::ports::{CacheEntry, ResponseCacheStore};

/// Default time-to-live for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

pub struct SemanticCache {
    store: Arc<dyn ResponseCacheStore>,
    ttl: Duration,
}

impl SemanticCache {
    pub fn new(store: Arc<dyn ResponseCacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached response for a structurally equal request, rebound
    /// to this request's id. Expired entries are misses.
    pub async fn get(&self, request: &AgentRequest) -> Option<AgentResponse> {
        let fingerprint = request.fingerprint();

        let entry = match self.store.get(&fingerprint).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(
                    request_id = %request.id(),
                    fingerprint = %fingerprint,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                return None;
            }
        };

        if entry.is_expired(Timestamp::now()) {
            tracing::debug!(request_id = %request.id(), fingerprint = %fingerprint, "Cache entry expired");
            return None;
        }

        tracing::debug!(
            request_id = %request.id(),
            agent_type = %request.agent_type(),
            fingerprint = %fingerprint,
            "Cache hit"
        );
        Some(entry.response.served_from_cache(request.id()))
    }

    /// Stores the response under the request's fingerprint. Last writer wins.
    pub async fn set(&self, request: &AgentRequest, response: &AgentResponse) {
        let fingerprint = request.fingerprint();
        let mut stored = response.clone();
        stored.cache_hit = false;

        let entry = CacheEntry::new(fingerprint.clone(), stored, self.ttl);
        if let Err(e) = self.store.put(entry).await {
            tracing::warn!(
                request_id = %request.id(),
                fingerprint = %fingerprint,
                error = %e,
                "Cache write failed"
            );
        }
    }

    /// Drops a cached entry whose payload no longer validates.
    pub async fn invalidate(&self, request: &AgentRequest) {
        let fingerprint = request.fingerprint();
        if let Err(e) = self.store.remove(&fingerprint).await {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache invalidation failed");
        }
    }

    /// Removes every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> u64 {
        match self.store.purge_expired(Timestamp::now()).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(error = %e, "Cache purge failed");
                0
            }
        }
    }
}
