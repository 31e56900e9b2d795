//! Quota stage (C3): checks and reserves monthly request/byte caps plus a
//! concurrent-connection slot before the call, records actual usage and
//! releases the slot after.

use axum::body::Body;
use http::{HeaderValue, Method, Request, Response};
use http_body::Body as _;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Enforces C3's monthly caps and connection limit around the downstream call.
#[derive(Clone, Default)]
pub struct QuotaGate;

impl Gate for QuotaGate {
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, state: &AppState) -> Result<(), GatewayError> {
        let Some(key_id) = ctx.key_id().map(str::to_string) else {
            return Ok(());
        };

        let estimated_bytes = req.body().size_hint().upper().unwrap_or(0);

        if let Err(err) = state.quota.check(&key_id, estimated_bytes).await {
            state.metrics.record_quota_rejection(&key_id);
            return Err(err.into());
        }
        if let Err(err) = state.quota.acquire_connection(&key_id) {
            state.metrics.record_quota_rejection(&key_id);
            return Err(err.into());
        }

        Ok(())
    }

    async fn observe(&self, ctx: &RequestContext, _method: &Method, _path: &str, response: &mut Response<Body>, state: &AppState) {
        let Some(key_id) = ctx.key_id() else {
            return;
        };

        state.quota.release_connection(key_id);

        let actual_bytes = response.body().size_hint().upper().unwrap_or(0);
        if let Err(err) = state.quota.record(key_id, actual_bytes).await {
            log::warn!("quota record failed for key {key_id}: {err}");
        }

        if let Ok(status) = state.quota.status(key_id).await {
            let limit = state.quota.limit(key_id);
            let headers = response.headers_mut();

            insert_header(headers, "x-quota-limit-requests", limit.monthly_request_cap);
            insert_header(headers, "x-quota-limit-bytes", limit.monthly_bytes_cap);
            insert_header(headers, "x-quota-reset", status.period_end.as_second());

            if let Some(remaining) = status.requests_remaining {
                insert_header(headers, "x-quota-remaining-requests", remaining);
            }
            if let Some(remaining) = status.bytes_remaining {
                insert_header(headers, "x-quota-remaining-bytes", remaining);
            }
        }
    }
}

fn insert_header(headers: &mut http::HeaderMap, name: &'static str, value: impl std::fmt::Display) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, value);
    }
}
