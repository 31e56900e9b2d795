//! Circuit-breaker stage (C2): acquires a generation before the call, and
//! records success/failure (5xx-only) against it once the response is known.
//!
//! The generation is snapshotted at entry and verified at exit rather than
//! holding the breaker's lock across the downstream call, so independent
//! requests on the same lease never serialize against each other.

use axum::body::Body;
use http::{Method, Request, Response};

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Acquires/releases a lease's circuit breaker around the downstream call.
#[derive(Clone, Default)]
pub struct BreakerGate;

impl Gate for BreakerGate {
    async fn check(&self, _req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError> {
        let Some(lease_id) = ctx.lease_id.as_deref() else {
            return Ok(());
        };

        let circuit = state.breakers.get_or_create(lease_id);
        let generation = circuit.try_acquire()?;
        ctx.breaker_generation = Some(generation);

        Ok(())
    }

    async fn observe(&self, ctx: &RequestContext, _method: &Method, _path: &str, response: &mut Response<Body>, state: &AppState) {
        let (Some(lease_id), Some(generation)) = (ctx.lease_id.as_deref(), ctx.breaker_generation) else {
            return;
        };

        let circuit = state.breakers.get_or_create(lease_id);

        if response.status().is_server_error() {
            circuit.record_failure(generation);
        } else {
            circuit.record_success(generation);
        }
    }
}
