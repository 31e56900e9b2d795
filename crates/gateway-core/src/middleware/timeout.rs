//! Deadline stage (C7): the one stage that cannot fit the [`super::Gate`]
//! shape, since it must wrap the downstream call itself rather than just
//! inspect the request and decorate the response.
//!
//! Runs after the ACL stage so the resolved lease id is already on the
//! context; a request with no lease id (the admin/auth-validate pipeline)
//! always gets the configured default.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, Response};
use tower::Layer;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

/// Wraps the downstream call in a per-lease deadline.
#[derive(Clone)]
pub struct TimeoutLayer {
    state: AppState,
}

impl TimeoutLayer {
    /// Builds the layer, bound to the shared state its deadline table lives on.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, next: S) -> Self::Service {
        TimeoutService { next, state: self.state.clone() }
    }
}

/// The `tower::Service` [`TimeoutLayer`] produces.
#[derive(Clone)]
pub struct TimeoutService<S> {
    next: S,
    state: AppState,
}

impl<S> tower::Service<Request<Body>> for TimeoutService<S>
where
    S: tower::Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut next = self.next.clone();

        let lease_id = req.extensions().get::<RequestContext>().and_then(|ctx| ctx.lease_id.as_deref().map(str::to_string));

        let deadline = match &lease_id {
            Some(lease_id) => self.state.timeout.deadline_for(lease_id),
            None => self.state.timeout.deadline_for(""),
        };

        if let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() {
            ctx.deadline = Some(Instant::now() + deadline);
        }

        Box::pin(async move {
            match tokio::time::timeout(deadline, next.call(req)).await {
                Ok(result) => result,
                Err(_) => Ok(GatewayError::GatewayTimeout.into_response()),
            }
        })
    }
}
