//! The shared state handed to every handler and middleware stage via axum's
//! `State` extractor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use acl::AclResolver;
use auth::Authenticator;
use circuit_breaker::CircuitRegistry;
use config::{AclConfig, BreakerConfig, RateLimitConfig, TimeoutConfig};
use quota::QuotaManager;
use rate_limit::RateLimiter;
use telemetry::Metrics;

use crate::storage_backend::AnyStorage;

/// Everything a pipeline stage or admin handler needs, cloned cheaply (every
/// field is an `Arc` or internally shared) and passed by value as axum state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) authenticator: Arc<Authenticator>,
    pub(crate) acl: Arc<RwLock<AclResolver>>,
    pub(crate) breakers: Arc<CircuitRegistry>,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) quota: Arc<QuotaManager<AnyStorage>>,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) timeout: Arc<TimeoutConfig>,
    pub(crate) shutting_down: Arc<AtomicBool>,
}

impl AppState {
    /// Assembles the shared state from the gateway's loaded configuration
    /// and connected storage backend.
    pub fn new(
        authenticator: Arc<Authenticator>,
        acl_config: AclConfig,
        breaker_config: BreakerConfig,
        rate_limit_config: RateLimitConfig,
        timeout_config: TimeoutConfig,
        quota: QuotaManager<AnyStorage>,
        metrics: Metrics,
    ) -> Self {
        let circuit_config = circuit_breaker::CircuitConfig {
            consecutive_failure_threshold: breaker_config.consecutive_failure_threshold,
            open_timeout: breaker_config.open_timeout(),
            max_half_open_requests: breaker_config.max_half_open_requests,
        };

        Self {
            authenticator,
            acl: Arc::new(RwLock::new(AclResolver::new(acl_config))),
            breakers: Arc::new(CircuitRegistry::new(circuit_config)),
            rate_limiter: Arc::new(RateLimiter::new(rate_limit_config)),
            quota: Arc::new(quota),
            metrics: Arc::new(metrics),
            timeout: Arc::new(timeout_config),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The quota manager, e.g. for an admin handler or a test harness that
    /// needs to seed or inspect usage directly.
    pub fn quota(&self) -> &QuotaManager<AnyStorage> {
        &self.quota
    }

    /// Whether the gateway has started draining for shutdown.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    /// Flips the shutdown flag the health endpoint reports against.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
    }
}
