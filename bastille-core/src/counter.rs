//! Per-identifier failed-attempt counter with a decay window.

use std::sync::Arc;

use chrono::Duration;

use crate::cache::AttemptCache;
use crate::error::CacheError;

/// Transient counter of failed attempts per identifier.
///
/// Counts live in the cache backend under a throttle key and expire after the
/// decay window. An absent key counts as zero. Reads and increments surface
/// backend errors (no lockout decision is possible without the counter);
/// [`AttemptCounter::clear`] is best-effort and never fails.
pub struct AttemptCounter {
    cache: Arc<dyn AttemptCache>,
    decay: Duration,
    max_attempts: u32,
}

impl AttemptCounter {
    pub fn new(cache: Arc<dyn AttemptCache>, decay_minutes: i64, max_attempts: u32) -> Self {
        Self {
            cache,
            decay: Duration::minutes(decay_minutes),
            max_attempts,
        }
    }

    /// Record one failed attempt and return the updated count.
    ///
    /// When the backend reports a missing key, the counter is seeded with 1
    /// and the decay TTL. A concurrent first failure can race the seed; the
    /// backend's last write wins and the count recovers on the next call.
    pub async fn record(&self, identifier: &str) -> Result<u64, CacheError> {
        let key = self.throttle_key(identifier);
        let count = self.cache.increment(&key).await?;

        if count == 0 {
            self.cache.put(&key, 1, self.decay).await?;
            return Ok(1);
        }

        Ok(count)
    }

    /// Current attempt count; 0 when no counter exists.
    pub async fn attempts(&self, identifier: &str) -> Result<u64, CacheError> {
        let key = self.throttle_key(identifier);
        Ok(self.cache.get(&key).await?.unwrap_or(0))
    }

    /// Whether the identifier has reached the lockout threshold.
    pub async fn has_too_many_attempts(&self, identifier: &str) -> Result<bool, CacheError> {
        Ok(self.attempts(identifier).await? >= u64::from(self.max_attempts))
    }

    /// Remove the counter. Idempotent; backend failures are logged and
    /// swallowed so callers can always treat clearing as successful.
    pub async fn clear(&self, identifier: &str) {
        let key = self.throttle_key(identifier);
        if let Err(e) = self.cache.forget(&key).await {
            tracing::warn!(identifier = %identifier, error = %e, "Failed to clear attempt counter");
        }
    }

    fn throttle_key(&self, identifier: &str) -> String {
        format!("login-attempts:{identifier}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryAttemptCache;

    fn counter(max_attempts: u32) -> AttemptCounter {
        AttemptCounter::new(Arc::new(MemoryAttemptCache::new()), 10, max_attempts)
    }

    #[tokio::test]
    async fn test_attempts_zero_before_any_record() {
        let counter = counter(5);
        assert_eq!(counter.attempts("a@x.com").await.unwrap(), 0);
        assert!(!counter.has_too_many_attempts("a@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_seeds_and_increments() {
        let counter = counter(5);
        assert_eq!(counter.record("a@x.com").await.unwrap(), 1);
        assert_eq!(counter.record("a@x.com").await.unwrap(), 2);
        assert_eq!(counter.attempts("a@x.com").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive_and_monotonic() {
        let counter = counter(3);

        for _ in 0..2 {
            counter.record("a@x.com").await.unwrap();
            assert!(!counter.has_too_many_attempts("a@x.com").await.unwrap());
        }

        counter.record("a@x.com").await.unwrap();
        assert!(counter.has_too_many_attempts("a@x.com").await.unwrap());

        // Stays true until cleared
        counter.record("a@x.com").await.unwrap();
        assert!(counter.has_too_many_attempts("a@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_resets_count() {
        let counter = counter(2);
        counter.record("a@x.com").await.unwrap();
        counter.record("a@x.com").await.unwrap();
        assert!(counter.has_too_many_attempts("a@x.com").await.unwrap());

        counter.clear("a@x.com").await;
        assert_eq!(counter.attempts("a@x.com").await.unwrap(), 0);
        assert!(!counter.has_too_many_attempts("a@x.com").await.unwrap());

        // Clearing an absent counter is a no-op
        counter.clear("a@x.com").await;
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let counter = counter(2);
        counter.record("a@x.com").await.unwrap();
        counter.record("a@x.com").await.unwrap();

        assert!(counter.has_too_many_attempts("a@x.com").await.unwrap());
        assert!(!counter.has_too_many_attempts("b@x.com").await.unwrap());
    }
}
