//! Authentication stage (C5): extracts and verifies the caller's API key.

use axum::body::Body;
use http::Request;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Runs [`auth::Authenticator::authenticate`] and attaches the resulting
/// principal to the context.
#[derive(Clone, Default)]
pub struct AuthGate;

impl Gate for AuthGate {
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError> {
        let principal = state.authenticator.authenticate(req.headers())?;
        ctx.principal = Some(principal);

        Ok(())
    }
}
