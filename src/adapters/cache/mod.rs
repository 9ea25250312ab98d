//! Response cache stores.
//!
//! - `InMemoryResponseCache` - bounded in-process map (default)
//! - `RedisResponseCache` - shared store with server-side expiry

mod in_memory;
mod redis;

pub use self::redis::{RedisResponseCache, DEFAULT_KEY_PREFIX};
pub use in_memory::{InMemoryResponseCache, DEFAULT_MAX_ENTRIES};
