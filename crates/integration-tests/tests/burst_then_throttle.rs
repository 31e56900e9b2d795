use axum::body::Body;
use config::{RateLimitConfig, RateLimitQuota};
use http::{Request, StatusCode};
use integration_tests::{Fixture, build, single_key_rule};
use tower::ServiceExt;

#[tokio::test]
async fn sixth_request_within_the_burst_window_is_throttled() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    fixture.rate_limits = RateLimitConfig {
        default: RateLimitQuota { rate_per_second: 5.0, burst: 5 },
        leases: Vec::new(),
    };

    let harness = build(fixture, || async { StatusCode::OK }).await;

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let request = Request::builder()
            .method("GET")
            .uri("/peer/L")
            .header("authorization", "Bearer sk_live_abc")
            .body(Body::empty())
            .unwrap();

        let response = harness.app.clone().oneshot(request).await.unwrap();

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after: u64 = response.headers().get("retry-after").unwrap().to_str().unwrap().parse().unwrap();
            assert!(retry_after >= 1);
        }

        statuses.push(response.status());
    }

    assert_eq!(&statuses[..5], [StatusCode::OK; 5]);
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}
