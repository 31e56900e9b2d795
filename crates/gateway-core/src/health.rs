//! Health endpoint, adapted from the teacher's `server::health`: reports
//! unhealthy while the gateway is draining for shutdown.

use axum::Json;
use axum::extract::State;
use http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum HealthState {
    Healthy,
    Draining,
}

/// Reports the gateway's health, returning 503 once shutdown has begun so a
/// load balancer stops routing new connections here.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthState>) {
    if state.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(HealthState::Draining))
    } else {
        (StatusCode::OK, Json(HealthState::Healthy))
    }
}

/// Renders the Prometheus registry in the text exposition format.
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}
