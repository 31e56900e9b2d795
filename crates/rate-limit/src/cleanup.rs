//! Background sweep that drops idle buckets from a [`RateLimiter`]'s cache.
//!
//! Mirrors `auth::reload::spawn_watch`'s shape: a detached task looping on
//! `tokio::time::sleep`, started once at process startup and left to run
//! for the life of the gateway.

use std::sync::Arc;
use std::time::Duration;

use crate::RateLimiter;

/// Spawns a task that calls [`RateLimiter::cleanup_expired`] every `interval`.
/// Runs until the returned task is aborted or the process exits.
pub fn spawn_cleanup(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            limiter.cleanup_expired();
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config::RateLimitConfig;

    use super::spawn_cleanup;
    use crate::{RateLimitRequest, RateLimiter};

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_buckets_past_the_idle_ttl() {
        let limiter = Arc::new(RateLimiter::with_idle_ttl(RateLimitConfig::default(), Duration::from_millis(50)));

        let request = RateLimitRequest::builder().lease("L").key("k1").build();
        limiter.check(&request).unwrap();
        assert_eq!(limiter.cache_len(), 1);

        let handle = spawn_cleanup(limiter.clone(), Duration::from_millis(10));

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.cache_len(), 0);
        handle.abort();
    }
}
