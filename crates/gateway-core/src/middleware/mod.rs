//! Pipeline stages, each wired onto the router as a `tower::Layer`.
//!
//! The teacher's `auth`/`client_identification`/`tracing`/`rate_limit`
//! middleware each hand-roll the same `Layer` → boxed-future `Service`
//! shape. [`Gate`] is that shape factored out once: a stage checks a
//! request before it reaches the handler and, optionally, decorates the
//! response once the handler (or a deeper stage) returns. Stages that
//! genuinely need to wrap the call itself — the deadline guard — still get
//! their own hand-rolled layer (see [`timeout`]).

mod acl;
mod authenticate;
mod breaker;
mod log;
mod metrics;
mod quota;
mod rate_limit;
mod require_scope;
mod streaming;
pub mod timeout;

pub use self::acl::AclGate;
pub use self::authenticate::AuthGate;
pub use self::breaker::BreakerGate;
pub use self::log::LogGate;
pub use self::metrics::MetricsGate;
pub use self::quota::QuotaGate;
pub use self::rate_limit::RateLimitGate;
pub use self::require_scope::RequireScopeGate;
pub use self::streaming::StreamingGate;
pub use self::timeout::TimeoutLayer;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, Response};
use tower::Layer;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

/// One request-admission stage. `check` runs before the handler and may
/// short-circuit the request; `observe` runs after, once a response exists,
/// and never fails — it only decorates.
#[allow(async_fn_in_trait)]
pub trait Gate: Clone + Send + Sync + 'static {
    /// Admits or rejects the request, and may attach state to `ctx` for
    /// later stages (or for this gate's own `observe`) to read.
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError>;

    /// Best-effort post-processing once a response exists, e.g. setting
    /// response headers or recording an outcome. Never fails. `method`/`path`
    /// are the original request's, captured before the request was consumed
    /// by the downstream call.
    async fn observe(&self, _ctx: &RequestContext, _method: &http::Method, _path: &str, _response: &mut Response<Body>, _state: &AppState) {}
}

/// Builds the `tower::Layer` for a [`Gate`], bound to the shared state.
#[derive(Clone)]
pub struct GateLayer<G> {
    gate: G,
    state: AppState,
}

impl<G: Gate> GateLayer<G> {
    /// Wraps `gate` for use as a `Router::layer`.
    pub fn new(gate: G, state: AppState) -> Self {
        Self { gate, state }
    }
}

impl<G: Gate, S> Layer<S> for GateLayer<G> {
    type Service = GateService<S, G>;

    fn layer(&self, next: S) -> Self::Service {
        GateService { next, gate: self.gate.clone(), state: self.state.clone() }
    }
}

/// The `tower::Service` a [`GateLayer`] produces.
#[derive(Clone)]
pub struct GateService<S, G> {
    next: S,
    gate: G,
    state: AppState,
}

impl<S, G> tower::Service<Request<Body>> for GateService<S, G>
where
    S: tower::Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
    G: Gate,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut next = self.next.clone();
        let gate = self.gate.clone();
        let state = self.state.clone();

        Box::pin(async move {
            let mut ctx = req.extensions().get::<RequestContext>().cloned().unwrap_or_else(fresh_context);
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            if let Err(err) = gate.check(&req, &mut ctx, &state).await {
                let mut response = err.into_response();
                gate.observe(&ctx, &method, &path, &mut response, &state).await;
                return Ok(response);
            }

            req.extensions_mut().insert(ctx.clone());

            let mut response = next.call(req).await?;
            gate.observe(&ctx, &method, &path, &mut response, &state).await;

            Ok(response)
        })
    }
}

fn fresh_context() -> RequestContext {
    RequestContext::new(Uuid::new_v4().simple().to_string())
}
