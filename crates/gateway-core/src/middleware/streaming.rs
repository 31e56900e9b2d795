//! Streaming-response negotiation (C8): detects a caller's request for a
//! streamed response and, once the handler has responded, enforces the
//! headers a streamed body needs to survive intermediary buffering.

use axum::body::Body;
use http::{HeaderValue, Method, Request, Response, header};

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

use super::Gate;

/// Detects a streaming request and decorates a streaming response.
#[derive(Clone, Default)]
pub struct StreamingGate;

impl Gate for StreamingGate {
    async fn check(&self, req: &Request<Body>, ctx: &mut RequestContext, _state: &AppState) -> Result<(), GatewayError> {
        ctx.wants_stream = wants_stream(req);
        Ok(())
    }

    async fn observe(&self, ctx: &RequestContext, _method: &Method, _path: &str, response: &mut Response<Body>, _state: &AppState) {
        if !ctx.wants_stream {
            return;
        }

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    }
}

fn wants_stream(req: &Request<Body>) -> bool {
    let headers = req.headers();

    if headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()).is_some_and(|v| v.contains("text/event-stream")) {
        return true;
    }
    if headers.get("x-stream").and_then(|v| v.to_str().ok()).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return true;
    }
    if headers
        .get(header::TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_header(name: &'static str, value: &str) -> Request<Body> {
        Request::builder().header(name, value).body(Body::empty()).unwrap()
    }

    #[test]
    fn accept_event_stream_is_detected() {
        assert!(wants_stream(&request_with_header("accept", "text/event-stream")));
    }

    #[test]
    fn x_stream_header_is_detected() {
        assert!(wants_stream(&request_with_header("x-stream", "true")));
    }

    #[test]
    fn plain_request_does_not_want_stream() {
        assert!(!wants_stream(&Request::builder().body(Body::empty()).unwrap()));
    }
}
