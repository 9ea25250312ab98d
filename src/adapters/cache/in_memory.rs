//! In-memory response cache store.
//!
//! Bounded `HashMap` keyed by fingerprint. When a write finds the store at
//! capacity it first drops expired entries, then the oldest entry.
//! Not shared between processes; use the Redis store for multi-server
//! deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::orchestration::Fingerprint;
use crate::ports::{CacheEntry, CacheError, ResponseCacheStore};

/// Default capacity.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    max_entries: usize,
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl InMemoryResponseCache {
    /// Creates a store holding at most `max_entries` (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn make_room(entries: &mut HashMap<Fingerprint, CacheEntry>, max_entries: usize) {
    let now = Timestamp::now();
    entries.retain(|_, entry| !entry.is_expired(now));

    while entries.len() >= max_entries {
        let oldest = entries
            .values()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.fingerprint.clone());
        match oldest {
            Some(fingerprint) => {
                entries.remove(&fingerprint);
            }
            None => break,
        }
    }
}

#[async_trait]
impl ResponseCacheStore for InMemoryResponseCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(fingerprint).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&entry.fingerprint) && entries.len() >= self.max_entries {
            make_room(&mut entries, self.max_entries);
        }
        entries.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        self.entries.write().await.remove(fingerprint);
        Ok(())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RequestId;
    use crate::domain::orchestration::{AgentResponse, TokenUsage};
    use std::time::Duration;

    fn entry(key: &str, ttl: Duration) -> CacheEntry {
        let response = AgentResponse::new(
            RequestId::new(),
            format!("{{\"key\":\"{}\"}}", key),
            TokenUsage::zero(),
            "mock",
            "mock-model-1",
        );
        CacheEntry::new(Fingerprint::from_hex(key), response, ttl)
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryResponseCache::default();
        store.put(entry("a", HOUR)).await.unwrap();

        let found = store.get(&Fingerprint::from_hex("a")).await.unwrap().unwrap();
        assert_eq!(found.response.content, "{\"key\":\"a\"}");
        assert!(store.get(&Fingerprint::from_hex("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn later_write_replaces_earlier() {
        let store = InMemoryResponseCache::default();
        let first = entry("a", HOUR);
        let mut second = entry("a", HOUR);
        second.response.content = "second".to_string();

        store.put(first).await.unwrap();
        store.put(second).await.unwrap();

        let found = store.get(&Fingerprint::from_hex("a")).await.unwrap().unwrap();
        assert_eq!(found.response.content, "second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn capacity_evicts_expired_first_then_oldest() {
        let store = InMemoryResponseCache::new(2);
        store.put(entry("expired", Duration::ZERO)).await.unwrap();
        store.put(entry("live", HOUR)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;

        store.put(entry("new", HOUR)).await.unwrap();
        assert!(store.get(&Fingerprint::from_hex("expired")).await.unwrap().is_none());
        assert!(store.get(&Fingerprint::from_hex("live")).await.unwrap().is_some());

        store.put(entry("newest", HOUR)).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.get(&Fingerprint::from_hex("live")).await.unwrap().is_none());
        assert!(store.get(&Fingerprint::from_hex("newest")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let store = InMemoryResponseCache::default();
        store.put(entry("old", Duration::ZERO)).await.unwrap();
        store.put(entry("fresh", HOUR)).await.unwrap();

        assert_eq!(store.purge_expired(Timestamp::now()).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}
