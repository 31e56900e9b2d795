//! Scope gate: rejects an authenticated principal that lacks a required scope.
//!
//! Runs after [`super::AuthGate`], which is the sole writer of `ctx.principal`.

use axum::body::Body;
use http::Request;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Requires the authenticated principal to carry a fixed scope.
#[derive(Clone)]
pub struct RequireScopeGate {
    scope: &'static str,
}

impl RequireScopeGate {
    /// Requires `scope` on every request this gate admits.
    pub fn new(scope: &'static str) -> Self {
        Self { scope }
    }
}

impl Gate for RequireScopeGate {
    async fn check(&self, _req: &Request<Body>, ctx: &mut RequestContext, _state: &AppState) -> Result<(), GatewayError> {
        let principal = ctx.principal.as_ref().ok_or(GatewayError::MissingApiKey)?;

        if !principal.has_scope(self.scope) {
            return Err(GatewayError::AccessDenied);
        }

        Ok(())
    }
}
