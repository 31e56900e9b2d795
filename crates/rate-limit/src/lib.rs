//! Per-lease rate limiting for the gateway.
//!
//! [`RateLimitCache`] (C1) is the low-level, per-key token-bucket cache.
//! [`policy`] (C6) resolves a lease id to the `(rate, burst)` pair it should
//! be limited under and derives the cache key. [`RateLimiter`] composes the
//! two into the single entry point the gateway's middleware calls.

#![deny(missing_docs)]

mod bucket;
mod cleanup;
mod error;
mod manager;
pub mod policy;
mod request;

use config::RateLimitConfig;

pub use bucket::TokenBucket;
pub use cleanup::spawn_cleanup;
pub use error::RateLimitError;
pub use manager::RateLimitCache;
pub use policy::Identity;
pub use request::{RateLimitRequest, RateLimitRequestBuilder};

/// The limit/remaining/reset counters for a successful rate-limit check,
/// rendered by the gateway as `X-RateLimit-*` response headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// The bucket's burst capacity (the `X-RateLimit-Limit` header).
    pub limit: u32,
    /// Whole tokens left after this request consumed one.
    pub remaining: u32,
    /// When the bucket will next have a token available.
    pub reset_at: std::time::Instant,
}

/// The gateway's rate limiter: resolves a request's lease-rate-limit policy
/// and checks it against the token-bucket cache.
pub struct RateLimiter {
    config: RateLimitConfig,
    cache: RateLimitCache,
}

impl RateLimiter {
    /// Creates a new limiter from a loaded configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            cache: RateLimitCache::new(),
        }
    }

    /// As [`new`](Self::new), with a custom idle TTL for the bucket cache.
    /// Exposed for tests that need the cleanup sweep to observe evictions
    /// without waiting an hour.
    pub fn with_idle_ttl(config: RateLimitConfig, idle_ttl: std::time::Duration) -> Self {
        Self {
            config,
            cache: RateLimitCache::with_idle_ttl(idle_ttl),
        }
    }

    /// Checks whether `request` is allowed under its resolved policy,
    /// consuming a token if so.
    pub fn check(&self, request: &RateLimitRequest) -> Result<(), RateLimitError> {
        self.check_detailed(request).map(|_| ())
    }

    /// As [`check`](Self::check), but also returns the limit/remaining
    /// counters the gateway exposes as `X-RateLimit-*` response headers.
    pub fn check_detailed(&self, request: &RateLimitRequest) -> Result<RateLimitDecision, RateLimitError> {
        let quota = policy::resolve_quota(&self.config, request.lease_id.as_deref());

        let ip_string = request.ip.map(|ip| ip.to_string());
        let identity = match &request.key_id {
            Some(key_id) => Identity::Key(key_id),
            None => Identity::Ip(ip_string.as_deref().unwrap_or("unknown")),
        };

        let key = policy::cache_key(request.lease_id.as_deref(), &identity);

        if self.cache.allow(&key, quota.rate_per_second, quota.burst) {
            let remaining = self.cache.remaining(&key, quota.rate_per_second, quota.burst);
            let reset_at = self.cache.reset_at(&key, quota.rate_per_second, quota.burst);

            Ok(RateLimitDecision { limit: quota.burst, remaining, reset_at })
        } else {
            let retry_after = self
                .cache
                .reset_at(&key, quota.rate_per_second, quota.burst)
                .saturating_duration_since(std::time::Instant::now());

            Err(RateLimitError::Throttled { retry_after })
        }
    }

    /// Drops idle buckets. Intended to be called periodically from a
    /// background task; see [`spawn_cleanup`].
    pub fn cleanup_expired(&self) {
        self.cache.cleanup_expired();
    }

    /// Number of buckets currently cached. Exposed for tests.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
