//! Circuit-breaker tuning shared by every lease's breaker.
//!
//! Unlike ACL/rate-limit/quota, breaker behavior has no per-lease override in
//! this gateway: every lease's [`circuit_breaker::Circuit`] (built by
//! `gateway-core` from this config) is trip-tuned identically.

use std::time::Duration;

use serde::Deserialize;

/// Breaker tuning, nested under `server.yaml`'s `breaker` key.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures (in Closed) that trip the breaker open.
    pub consecutive_failure_threshold: u32,
    /// Seconds Open rejects calls before allowing a HalfOpen probe.
    pub open_timeout_secs: u64,
    /// Concurrent probes admitted while HalfOpen.
    pub max_half_open_requests: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            consecutive_failure_threshold: 5,
            open_timeout_secs: 30,
            max_half_open_requests: 1,
        }
    }
}

impl BreakerConfig {
    /// The configured Open-state rejection window.
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}
