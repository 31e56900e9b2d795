//! Metrics stage: records request count/duration against the shared
//! Prometheus registry.

use axum::body::Body;
use http::{Request, Response};

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Records one `requests_total`/`request_duration_seconds` observation per
/// completed request, keyed by method/route/status.
#[derive(Clone, Default)]
pub struct MetricsGate;

impl Gate for MetricsGate {
    async fn check(&self, _req: &Request<Body>, _ctx: &mut RequestContext, _state: &AppState) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn observe(&self, ctx: &RequestContext, method: &http::Method, path: &str, response: &mut Response<Body>, state: &AppState) {
        let route = ctx.lease_id.as_deref().unwrap_or(path);
        state.metrics.record_request(method.as_str(), route, response.status().as_u16(), ctx.started_at.elapsed());
    }
}
