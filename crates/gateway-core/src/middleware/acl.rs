//! Access-control stage (C4): extracts the lease id from the path, then
//! checks the authenticated key and client IP against the resolved rule.
//!
//! The lease id in the URL path (`/peer/{lease_id}/...`) is authoritative;
//! this is the sole writer of [`RequestContext::lease_id`] (see
//! [`crate::context`]).

use std::net::SocketAddr;

use acl::Outcome;
use axum::body::Body;
use axum::extract::ConnectInfo;
use http::Request;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Checks the request's lease id against the ACL rule table.
#[derive(Clone, Default)]
pub struct AclGate;

impl Gate for AclGate {
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError> {
        let lease_id = lease_id_from_path(req.uri().path()).ok_or(GatewayError::InvalidLeaseId)?;
        let key_id = ctx.key_id().unwrap_or_default().to_string();

        let remote = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
        let client_ip = acl::extract_client_ip(req.headers(), remote);

        let outcome = state.acl.read().expect("acl lock poisoned").check(&lease_id, &key_id, client_ip);

        ctx.lease_id = Some(lease_id);
        ctx.client_ip = client_ip;

        match outcome {
            Outcome::Ok => Ok(()),
            Outcome::LeaseNotFound => Err(GatewayError::LeaseNotFound),
            Outcome::KeyNotAllowed => Err(GatewayError::AccessDenied),
            Outcome::IpNotWhitelisted => Err(GatewayError::IpNotWhitelisted),
            Outcome::InvalidLease => Err(GatewayError::InvalidLeaseId),
        }
    }
}

/// Pulls the `{lease_id}` segment out of a `/peer/{lease_id}/...` path.
fn lease_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/peer/")?;
    let lease_id = rest.split('/').next().unwrap_or(rest);

    (!lease_id.is_empty()).then(|| lease_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lease_id_up_to_next_segment() {
        assert_eq!(lease_id_from_path("/peer/svc-a/v1/models"), Some("svc-a".to_string()));
        assert_eq!(lease_id_from_path("/peer/svc-a"), Some("svc-a".to_string()));
    }

    #[test]
    fn rejects_missing_lease_segment() {
        assert_eq!(lease_id_from_path("/peer/"), None);
        assert_eq!(lease_id_from_path("/other"), None);
    }
}
