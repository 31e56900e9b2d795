//! Logging stage: assigns/observes the request id and logs start/completion.

use axum::body::Body;
use http::{Request, Response};

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Outermost stage: the first to see a fresh context, so this is where
/// `request_id` is effectively assigned (the generic [`super::GateService`]
/// creates it lazily; being outermost, this gate is always the one to find
/// it missing).
#[derive(Clone, Default)]
pub struct LogGate;

impl Gate for LogGate {
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, _state: &AppState) -> Result<(), GatewayError> {
        log::info!("[{}] {} {} started", ctx.request_id, req.method(), req.uri().path());

        Ok(())
    }

    async fn observe(&self, ctx: &RequestContext, _method: &http::Method, _path: &str, response: &mut Response<Body>, _state: &AppState) {
        log::info!(
            "[{}] completed status={} duration_ms={}",
            ctx.request_id,
            response.status().as_u16(),
            ctx.started_at.elapsed().as_millis()
        );
    }
}
