use axum::body::Body;
use http::{Request, StatusCode};
use integration_tests::{Fixture, build, single_key_rule};
use tower::ServiceExt;

#[tokio::test]
async fn admitted_request_carries_remaining_one_below_burst() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    let burst = fixture.rate_limits.default.burst;

    let harness = build(fixture, || async { StatusCode::OK }).await;

    let request = Request::builder()
        .method("GET")
        .uri("/peer/L")
        .header("authorization", "Bearer sk_live_abc")
        .body(Body::empty())
        .unwrap();

    let response = harness.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let remaining: u32 = response.headers().get("x-ratelimit-remaining").unwrap().to_str().unwrap().parse().unwrap();
    assert_eq!(remaining, burst - 1);
}
