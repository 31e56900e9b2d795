//! The per-request side-channel threaded through the pipeline.
//!
//! Attached to the request's extensions by whichever stage runs first (the
//! outermost layer, ordinarily the logging stage); every later stage reads
//! the existing context rather than creating its own. Each field has a
//! single stage that writes it — lease-id is written only by the ACL stage
//! (see [`crate::middleware::acl`]), downstream stages must only read it.

use std::net::IpAddr;
use std::time::Instant;

use auth::Principal;
use circuit_breaker::Generation;
use rate_limit::RateLimitDecision;

/// Request-scoped context, built up by the pipeline as a request is admitted.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// 128-bit hex request id, assigned by the first pipeline stage.
    pub request_id: String,
    /// When the request entered the pipeline, used to compute total duration.
    pub started_at: Instant,
    /// The authenticated caller, attached by the authenticator stage.
    pub principal: Option<Principal>,
    /// The lease this request targets, attached by the ACL stage.
    pub lease_id: Option<String>,
    /// The client's address as resolved by [`acl::extract_client_ip`].
    pub client_ip: Option<IpAddr>,
    /// The deadline this request must complete by, attached by the timeout stage.
    pub deadline: Option<Instant>,
    /// The generation this request's call was admitted under, attached by
    /// the breaker stage so the matching `record_success`/`record_failure`
    /// can be issued once the downstream status is known.
    pub breaker_generation: Option<Generation>,
    /// The outcome of the per-lease rate-limit check, rendered as
    /// `X-RateLimit-*` response headers.
    pub rate_limit_decision: Option<RateLimitDecision>,
    /// Whether this request negotiated a streaming response (C8).
    pub wants_stream: bool,
}

impl RequestContext {
    /// Creates a fresh context carrying only a request id.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            principal: None,
            lease_id: None,
            client_ip: None,
            deadline: None,
            breaker_generation: None,
            rate_limit_decision: None,
            wants_stream: false,
        }
    }

    /// The authenticated caller's `key_id`, if authentication has run.
    pub fn key_id(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.key_id.as_str())
    }
}
