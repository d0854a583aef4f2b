//! Cache abstraction backing the attempt counter.
//!
//! The contract mirrors the increment semantics of common key-value stores:
//! `increment` is atomic for an existing key and reports a missing key by
//! returning 0 without creating it, so the caller can seed the counter with a
//! TTL. Two concurrent first failures can both observe 0 and race on the
//! seed; the store's last write wins and the counter self-heals on the next
//! increment. This window is accepted, not worked around with locking.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::error::CacheError;

/// Key-value counter store with TTL semantics.
#[async_trait]
pub trait AttemptCache: Send + Sync + 'static {
    /// Atomically increment `key` and return the new value, or return 0 when
    /// the key does not exist (nothing is created).
    async fn increment(&self, key: &str) -> Result<u64, CacheError>;

    /// Store `value` under `key` with the given TTL, replacing any existing
    /// entry.
    async fn put(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CacheError>;

    /// Current value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn forget(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CounterEntry {
    count: u64,
    expires_at: DateTime<Utc>,
}

impl CounterEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-process [`AttemptCache`] backed by a concurrent map.
///
/// Entries expire lazily: an expired entry behaves as absent on access and is
/// dropped on the next read or write that touches it.
#[derive(Default)]
pub struct MemoryAttemptCache {
    entries: DashMap<String, CounterEntry>,
}

impl MemoryAttemptCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptCache for MemoryAttemptCache {
    async fn increment(&self, key: &str) -> Result<u64, CacheError> {
        let now = Utc::now();

        // The guard must be released before touching the map again, or the
        // shard lock deadlocks.
        let mut expired = false;
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired(now) {
                expired = true;
            } else {
                entry.count += 1;
                return Ok(entry.count);
            }
        }

        if expired {
            self.entries.remove(key);
        }

        Ok(0)
    }

    async fn put(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            CounterEntry {
                count: value,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let now = Utc::now();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.count)),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }

        Ok(None)
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_missing_key_returns_zero() {
        let cache = MemoryAttemptCache::new();
        assert_eq!(cache.increment("missing").await.unwrap(), 0);
        // No entry was created
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_increment() {
        let cache = MemoryAttemptCache::new();
        cache.put("key", 1, Duration::minutes(10)).await.unwrap();
        assert_eq!(cache.increment("key").await.unwrap(), 2);
        assert_eq!(cache.increment("key").await.unwrap(), 3);
        assert_eq!(cache.get("key").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_expired_entry_behaves_as_absent() {
        let cache = MemoryAttemptCache::new();
        cache.put("key", 5, Duration::seconds(-1)).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), None);

        cache.put("key", 5, Duration::seconds(-1)).await.unwrap();
        assert_eq!(cache.increment("key").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_forget_is_idempotent() {
        let cache = MemoryAttemptCache::new();
        cache.put("key", 1, Duration::minutes(10)).await.unwrap();
        cache.forget("key").await.unwrap();
        cache.forget("key").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_updates() {
        use std::sync::Arc;

        let cache = Arc::new(MemoryAttemptCache::new());
        cache.put("key", 0, Duration::minutes(10)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.increment("key").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.get("key").await.unwrap(), Some(16));
    }
}
