//! Assembles the gateway's two router variants: the protected `/peer/*`
//! relay (full C9 stage order) and the thin auth-only/admin surface.
//!
//! `Router::layer` wraps its current stack around the next call, so the
//! outermost layer (first in this list, applied last below) runs first. To
//! get log→metrics→auth→acl→timeout→breaker→quota→rate-limit→streaming, the
//! `.layer()` calls are issued in the REVERSE of that order.

use axum::Json;
use axum::Router;
use axum::extract::Extension;
use axum::routing::get;
use serde::Serialize;

use crate::context::RequestContext;
use crate::middleware::{
    AclGate, AuthGate, BreakerGate, GateLayer, LogGate, MetricsGate, QuotaGate, RateLimitGate, RequireScopeGate, StreamingGate, TimeoutLayer,
};
use crate::state::AppState;
use crate::{admin, health, terminal};

#[derive(Serialize)]
struct ValidatedPrincipal {
    key_id: String,
    scopes: Vec<String>,
    expires_at: Option<jiff::Timestamp>,
}

async fn auth_validate(Extension(ctx): Extension<RequestContext>) -> Json<Option<ValidatedPrincipal>> {
    Json(ctx.principal.map(|p| ValidatedPrincipal {
        key_id: p.key_id,
        scopes: p.scopes.into_iter().collect(),
        expires_at: p.expires_at,
    }))
}

/// Builds the full application router: public health/metrics, `/auth/validate`,
/// the protected `/peer/*` relay, and the admin surface.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(auth_validate_router(state.clone()))
        .merge(protected_router(state.clone()))
        .nest("/admin", admin_router(state.clone()))
        .with_state(state)
}

fn protected_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/peer/{*rest}", axum::routing::any(terminal::echo))
        .layer(GateLayer::new(StreamingGate, state.clone()))
        .layer(GateLayer::new(RateLimitGate, state.clone()))
        .layer(GateLayer::new(QuotaGate, state.clone()))
        .layer(GateLayer::new(BreakerGate, state.clone()))
        .layer(TimeoutLayer::new(state.clone()))
        .layer(GateLayer::new(AclGate, state.clone()))
        .layer(GateLayer::new(AuthGate, state.clone()))
        .layer(GateLayer::new(MetricsGate, state.clone()))
        .layer(GateLayer::new(LogGate, state))
}

fn auth_validate_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/validate", get(auth_validate))
        .layer(GateLayer::new(RateLimitGate, state.clone()))
        .layer(GateLayer::new(AuthGate, state.clone()))
        .layer(GateLayer::new(MetricsGate, state.clone()))
        .layer(GateLayer::new(LogGate, state))
}

fn admin_router(state: AppState) -> Router<AppState> {
    admin::router()
        .layer(GateLayer::new(RequireScopeGate::new("admin"), state.clone()))
        .layer(GateLayer::new(RateLimitGate, state.clone()))
        .layer(GateLayer::new(AuthGate, state.clone()))
        .layer(GateLayer::new(MetricsGate, state.clone()))
        .layer(GateLayer::new(LogGate, state))
}
