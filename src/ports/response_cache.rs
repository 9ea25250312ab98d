//! ResponseCacheStore port - Storage behind the semantic cache.
//!
//! Entries are keyed by request fingerprint and carry their own expiry.
//! Stores never interpret the response; TTL checks and degradation on
//! backend errors live in the semantic cache service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::Timestamp;
use crate::domain::orchestration::{AgentResponse, Fingerprint};

/// A stored response. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub response: AgentResponse,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, response: AgentResponse, ttl: Duration) -> Self {
        let created_at = Timestamp::now();
        Self {
            fingerprint,
            response,
            created_at,
            expires_at: created_at.plus(ttl),
        }
    }

    /// Expired once `now` reaches `expires_at`; a zero TTL is expired immediately.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Time left before expiry, zero if already expired.
    pub fn remaining_ttl(&self, now: Timestamp) -> Duration {
        self.expires_at
            .duration_since(&now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Cache backend errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be encoded or decoded: {0}")]
    Serialization(String),
}

/// Port for cache storage.
#[async_trait]
pub trait ResponseCacheStore: Send + Sync {
    /// Returns the stored entry, expired or not.
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError>;

    /// Inserts or replaces the entry for its fingerprint (last writer wins).
    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError>;

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<(), CacheError>;

    /// Drops every entry expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CacheError>;
}
