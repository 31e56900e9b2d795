use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use integration_tests::{Fixture, build, single_key_rule};
use tower::ServiceExt;

#[tokio::test]
async fn rule_blocks_by_ip_and_admits_a_whitelisted_one() {
    let (key, mut rule) = single_key_rule("k1", "sk_live_abc", "L");
    rule.allowed_cidrs = vec!["192.168.1.0/24".parse().unwrap()];

    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);

    let harness = build(fixture, || async { StatusCode::OK }).await;

    let request = |ip: &str| {
        Request::builder()
            .method("GET")
            .uri("/peer/L")
            .header("authorization", "Bearer sk_live_abc")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let response = harness.app.clone().oneshot(request("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "ip_not_whitelisted");

    let response = harness.app.clone().oneshot(request("192.168.1.5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
