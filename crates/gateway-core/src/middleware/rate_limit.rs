//! Per-lease rate-limit stage (C6): consumes a token from the caller's
//! bucket and renders the decision as `X-RateLimit-*` headers.

use axum::body::Body;
use http::{HeaderValue, Method, Request, Response};
use jiff::{SignedDuration, Timestamp};
use rate_limit::RateLimitRequest;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Checks the per-lease token bucket and attaches the decision to the context.
#[derive(Clone, Default)]
pub struct RateLimitGate;

impl Gate for RateLimitGate {
    async fn check(&self, _req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError> {
        let mut builder = RateLimitRequest::builder();

        if let Some(lease_id) = &ctx.lease_id {
            builder = builder.lease(lease_id.clone());
        }
        if let Some(key_id) = ctx.key_id() {
            builder = builder.key(key_id);
        }
        if let Some(ip) = ctx.client_ip {
            builder = builder.ip(ip);
        }

        match state.rate_limiter.check_detailed(&builder.build()) {
            Ok(decision) => {
                ctx.rate_limit_decision = Some(decision);
                Ok(())
            }
            Err(err) => {
                state.metrics.record_rate_limit_rejection(ctx.lease_id.as_deref().unwrap_or("unknown"));
                Err(err.into())
            }
        }
    }

    async fn observe(&self, ctx: &RequestContext, _method: &Method, _path: &str, response: &mut Response<Body>, _state: &AppState) {
        let Some(decision) = ctx.rate_limit_decision else {
            return;
        };

        let headers = response.headers_mut();
        let reset_in = decision.reset_at.saturating_duration_since(std::time::Instant::now());
        let reset_at = Timestamp::now() + SignedDuration::try_from(reset_in).unwrap_or_default();

        if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
            headers.insert("x-ratelimit-limit", value);
        }
        if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
            headers.insert("x-ratelimit-remaining", value);
        }
        if let Ok(value) = HeaderValue::from_str(&reset_at.as_second().to_string()) {
            headers.insert("x-ratelimit-reset", value);
        }
    }
}
