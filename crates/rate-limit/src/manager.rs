//! Token-bucket limiter cache: the per-key cache of [`TokenBucket`]s, with
//! lazy refill and idle-TTL eviction.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};

use crate::bucket::TokenBucket;

/// Buckets idle longer than this are dropped by [`RateLimitCache::cleanup_expired`].
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(3600);

struct Entry {
    bucket: TokenBucket,
    last_accessed: Instant,
}

/// The per-key token-bucket cache (component C1).
///
/// Keys are independent: each gets its own bucket and its own lock, so one
/// hot key never blocks another. Lookup takes the shared read lock on the
/// map; only bucket creation takes the exclusive write lock, and even then
/// only for the instant it takes to insert — a thread that loses the race
/// to create a bucket discovers the winner's entry via a second lookup
/// rather than overwriting it.
pub struct RateLimitCache {
    buckets: RwLock<HashMap<String, Arc<Mutex<Entry>>>>,
    idle_ttl: Duration,
}

impl RateLimitCache {
    /// Creates an empty cache with the default idle TTL.
    pub fn new() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }

    /// Creates an empty cache with a custom idle TTL.
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    fn get_or_create(&self, key: &str, rate: f64, burst: u32, now: Instant) -> Arc<Mutex<Entry>> {
        if let Some(entry) = self.buckets.read().unwrap().get(key) {
            return entry.clone();
        }

        let mut buckets = self.buckets.write().unwrap();

        if let Some(entry) = buckets.get(key) {
            return entry.clone();
        }

        let entry = Arc::new(Mutex::new(Entry {
            bucket: TokenBucket::new(rate, burst, now),
            last_accessed: now,
        }));

        buckets.insert(key.to_string(), entry.clone());

        entry
    }

    /// Checks and, if allowed, consumes one token from `key`'s bucket.
    /// Creates the bucket (full) on first use.
    pub fn allow(&self, key: &str, rate: f64, burst: u32) -> bool {
        let now = Instant::now();
        let entry = self.get_or_create(key, rate, burst, now);
        let mut entry = entry.lock().unwrap();
        entry.last_accessed = now;

        entry.bucket.allow(now)
    }

    /// The number of whole tokens currently available for `key`.
    pub fn remaining(&self, key: &str, rate: f64, burst: u32) -> u32 {
        let now = Instant::now();
        let entry = self.get_or_create(key, rate, burst, now);
        let mut entry = entry.lock().unwrap();
        entry.last_accessed = now;

        entry.bucket.remaining(now)
    }

    /// The instant at which `key`'s bucket will next have a token available.
    pub fn reset_at(&self, key: &str, rate: f64, burst: u32) -> Instant {
        let now = Instant::now();
        let entry = self.get_or_create(key, rate, burst, now);
        let mut entry = entry.lock().unwrap();
        entry.last_accessed = now;

        entry.bucket.reset_at(now)
    }

    /// Drops buckets that have not been touched within the idle TTL.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut buckets = self.buckets.write().unwrap();

        buckets.retain(|_, entry| {
            let entry = entry.lock().unwrap();
            now.saturating_duration_since(entry.last_accessed) < self.idle_ttl
        });
    }

    /// Number of buckets currently cached. Exposed for tests and metrics.
    pub fn len(&self) -> usize {
        self.buckets.read().unwrap().len()
    }

    /// Whether the cache currently holds no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RateLimitCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_keys_have_independent_buckets() {
        let cache = RateLimitCache::new();

        assert!(cache.allow("a", 1.0, 1));
        assert!(!cache.allow("a", 1.0, 1));
        assert!(cache.allow("b", 1.0, 1));
    }

    #[test]
    fn cleanup_expired_drops_idle_buckets() {
        let cache = RateLimitCache::with_idle_ttl(Duration::from_millis(1));

        cache.allow("a", 1.0, 1);
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        cache.cleanup_expired();

        assert!(cache.is_empty());
    }
}
