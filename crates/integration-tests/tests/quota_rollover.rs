use axum::body::Body;
use config::{QuotaConfig, QuotaLimit};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use integration_tests::{Fixture, build, single_key_rule};
use jiff::{Timestamp, Zoned, tz::TimeZone};
use storage::QuotaStorage;
use tower::ServiceExt;

/// Mirrors `quota::period::current_period_start`, duplicated here since that
/// module is private to the `quota` crate.
fn current_month_start() -> Timestamp {
    let zoned: Zoned = Timestamp::now().to_zoned(TimeZone::UTC);
    zoned.date().first_of_month().to_zoned(TimeZone::UTC).expect("first-of-month is always valid").timestamp()
}

fn request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/peer/L")
        .header("authorization", "Bearer sk_live_abc")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn usage_caps_this_month_and_resets_once_the_stored_period_is_stale() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    fixture.quota = QuotaConfig {
        default: QuotaLimit { monthly_request_cap: 1000, monthly_bytes_cap: 10240, concurrent_connection_cap: 0 },
        ..QuotaConfig::default()
    };

    let harness = build(fixture, || async { StatusCode::OK }).await;

    let this_month = current_month_start();
    let now = Timestamp::now();
    harness.state.quota().storage().update_usage("k1", 999, 9000, this_month, now).await.unwrap();

    let response = harness.app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness.app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "quota_exceeded");

    // Simulate the clock having advanced to the next month: the stored row
    // is now from a period that no longer matches `current_month_start()`,
    // which is exactly the condition `QuotaManager::check`/`record` treat as
    // a fresh period.
    let stale_period: Timestamp = "2000-01-01T00:00:00Z".parse().unwrap();
    harness.state.quota().storage().update_usage("k1", 999, 9000, stale_period, now).await.unwrap();

    let response = harness.app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "a stale stored period must be treated as a fresh one");
}
