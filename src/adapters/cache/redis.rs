//! Redis-backed response cache store for multi-server deployments.
//!
//! Each entry is stored as JSON under `{prefix}{fingerprint}` with `SETEX`,
//! so Redis drops it when its TTL runs out and the periodic purge has
//! nothing to do.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::domain::orchestration::Fingerprint;
use crate::ports::{CacheEntry, CacheError, ResponseCacheStore};

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "coach:cache:";

#[derive(Clone)]
pub struct RedisResponseCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisResponseCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn))
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, fingerprint: &Fingerprint) -> String {
        format!("{}{}", self.key_prefix, fingerprint)
    }
}

#[async_trait]
impl ResponseCacheStore for RedisResponseCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.key(fingerprint))
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| CacheError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let ttl_secs = entry.remaining_ttl(Timestamp::now()).as_secs();
        let key = self.key(&entry.fingerprint);
        let mut conn = self.conn.clone();

        // Nothing to keep; clear any older value so last writer still wins
        if ttl_secs == 0 {
            return conn
                .del::<_, ()>(key)
                .await
                .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()));
        }

        let json =
            serde_json::to_string(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;
        conn.set_ex::<_, _, ()>(key, json, ttl_secs)
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(fingerprint))
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))
    }

    async fn purge_expired(&self, _now: Timestamp) -> Result<u64, CacheError> {
        Ok(0)
    }
}
