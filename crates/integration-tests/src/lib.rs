//! Harness shared by the scenario tests under `tests/`: assembles the same
//! stage order `gateway_core::pipeline`'s protected router uses, but with a
//! substitutable terminal handler so a scenario can control what the
//! "upstream" does without touching the pipeline itself.

use std::sync::Arc;

use auth::Authenticator;
use axum::Router;
use axum::routing::any;
use config::{AclConfig, AuthConfig, BreakerConfig, QuotaConfig, RateLimitConfig, TimeoutConfig};
use gateway_core::middleware::{
    AclGate, AuthGate, BreakerGate, GateLayer, LogGate, MetricsGate, QuotaGate, RateLimitGate, StreamingGate, TimeoutLayer,
};
use gateway_core::{AnyStorage, AppState};
use telemetry::Metrics;

/// Everything a scenario needs: the assembled router and the state it
/// shares, for seeding or inspecting storage directly.
pub struct Harness {
    /// The router under test, with the full `/peer/*` stage order.
    pub app: Router,
    /// The shared state the router was built over.
    pub state: AppState,
}

/// Fixture config, one field per concern, with gateway-wide defaults a
/// scenario can override piecemeal.
pub struct Fixture {
    pub auth: AuthConfig,
    pub acl: AclConfig,
    pub breaker: BreakerConfig,
    pub rate_limits: RateLimitConfig,
    pub timeout: TimeoutConfig,
    pub quota: QuotaConfig,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            acl: AclConfig::default(),
            breaker: BreakerConfig::default(),
            rate_limits: RateLimitConfig::default(),
            timeout: TimeoutConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

/// Builds a `Harness` whose `/peer/{*rest}` route ends at `terminal` instead
/// of the production echo placeholder, wired with the production stage
/// order: log -> metrics -> auth -> acl -> timeout -> breaker -> quota ->
/// rate-limit -> streaming -> terminal.
pub async fn build<H, T>(fixture: Fixture, terminal: H) -> Harness
where
    H: axum::handler::Handler<T, AppState>,
    T: 'static,
{
    let authenticator = Arc::new(Authenticator::new(fixture.auth));
    let storage = AnyStorage::connect(&fixture.quota.storage).await.expect("in-memory storage never fails to connect");
    let quota_manager = quota::QuotaManager::new(fixture.quota, storage);

    let state = AppState::new(authenticator, fixture.acl, fixture.breaker, fixture.rate_limits, fixture.timeout, quota_manager, Metrics::new());

    let protected = Router::new()
        .route("/peer/{*rest}", any(terminal))
        .layer(GateLayer::new(StreamingGate, state.clone()))
        .layer(GateLayer::new(RateLimitGate, state.clone()))
        .layer(GateLayer::new(QuotaGate, state.clone()))
        .layer(GateLayer::new(BreakerGate, state.clone()))
        .layer(TimeoutLayer::new(state.clone()))
        .layer(GateLayer::new(AclGate, state.clone()))
        .layer(GateLayer::new(AuthGate, state.clone()))
        .layer(GateLayer::new(MetricsGate, state.clone()))
        .layer(GateLayer::new(LogGate, state.clone()));

    let app = protected.with_state(state.clone());

    Harness { app, state }
}

/// Builds an `ApiKeyConfig`/`AclRule` pair for the common case: one key
/// allowed on one lease, no IP restriction.
pub fn single_key_rule(key_id: &str, secret: &str, lease_id: &str) -> (config::ApiKeyConfig, config::AclRule) {
    let key = config::ApiKeyConfig {
        key_id: key_id.to_string(),
        key: secret.to_string(),
        scopes: Default::default(),
        expires_at: None,
    };

    let rule = config::AclRule {
        lease_id_pattern: lease_id.to_string(),
        allowed_key_ids: [key_id.to_string()].into_iter().collect(),
        allowed_cidrs: Vec::new(),
    };

    (key, rule)
}
