//! The configured `open_timeout_secs` only resolves to whole seconds, so
//! this exercises the same Closed->Open->HalfOpen->Closed transition the
//! scenario describes at 1-second granularity instead of 50ms, with a real
//! sleep across the boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::body::Body;
use config::BreakerConfig;
use http::{Request, StatusCode};
use integration_tests::{Fixture, build, single_key_rule};
use tower::ServiceExt;

#[tokio::test]
async fn breaker_trips_then_closes_after_two_successful_probes() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    fixture.breaker = BreakerConfig {
        consecutive_failure_threshold: 3,
        open_timeout_secs: 1,
        max_half_open_requests: 2,
    };

    let attempts = Arc::new(AtomicU32::new(0));
    let handler_attempts = attempts.clone();

    let harness = build(fixture, move || {
        let attempts = handler_attempts.clone();
        async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 3 { StatusCode::INTERNAL_SERVER_ERROR } else { StatusCode::OK }
        }
    })
    .await;

    let request = || {
        Request::builder()
            .method("GET")
            .uri("/peer/L")
            .header("authorization", "Bearer sk_live_abc")
            .body(Body::empty())
            .unwrap()
    };

    let mut statuses = Vec::new();
    for _ in 0..4 {
        statuses.push(harness.app.clone().oneshot(request()).await.unwrap().status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::INTERNAL_SERVER_ERROR, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::SERVICE_UNAVAILABLE]
    );

    tokio::time::sleep(Duration::from_millis(1100)).await;

    for _ in 0..2 {
        let status = harness.app.clone().oneshot(request()).await.unwrap().status();
        assert_eq!(status, StatusCode::OK);
    }

    let status = harness.app.clone().oneshot(request()).await.unwrap().status();
    assert_eq!(status, StatusCode::OK);
}
