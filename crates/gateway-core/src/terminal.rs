//! The placeholder terminal handler (Non-goal: no upstream routing).
//!
//! Every admitted request ends here, its whole admission history rendered
//! back as JSON instead of being proxied to a lease's real backend.

use axum::Json;
use axum::extract::{Extension, State};
use http::StatusCode;
use serde::Serialize;

use crate::context::RequestContext;
use crate::state::AppState;

#[derive(Serialize)]
struct EchoedContext {
    request_id: String,
    lease_id: Option<String>,
    key_id: Option<String>,
    scopes: Vec<String>,
    client_ip: Option<String>,
    wants_stream: bool,
}

/// Echoes the request's admitted context instead of proxying it anywhere.
pub async fn echo(State(_state): State<AppState>, Extension(ctx): Extension<RequestContext>) -> (StatusCode, Json<EchoedContext>) {
    let body = EchoedContext {
        request_id: ctx.request_id,
        lease_id: ctx.lease_id,
        key_id: ctx.principal.as_ref().map(|p| p.key_id.clone()),
        scopes: ctx.principal.map(|p| p.scopes.into_iter().collect()).unwrap_or_default(),
        client_ip: ctx.client_ip.map(|ip| ip.to_string()),
        wants_stream: ctx.wants_stream,
    };

    (StatusCode::OK, Json(body))
}
