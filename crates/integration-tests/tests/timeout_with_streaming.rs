use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::response::Response;
use config::TimeoutConfig;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use integration_tests::{Fixture, build, single_key_rule};
use tower::ServiceExt;

fn request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/peer/L")
        .header("authorization", "Bearer sk_live_abc")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn silent_handler_past_the_deadline_gets_a_gateway_timeout() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    fixture.timeout = TimeoutConfig { default_ms: 100, leases: Vec::new() };

    let harness = build(fixture, || async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        StatusCode::OK
    })
    .await;

    let response = harness.app.oneshot(request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "gateway_timeout");
}

#[tokio::test]
async fn early_chunk_survives_a_deadline_the_handler_future_never_sees() {
    let (key, rule) = single_key_rule("k1", "sk_live_abc", "L");
    let mut fixture = Fixture::default();
    fixture.auth.keys.push(key);
    fixture.acl.rules.push(rule);
    fixture.timeout = TimeoutConfig { default_ms: 100, leases: Vec::new() };

    // The deadline stage only wraps the future that produces the response,
    // not the body it carries, so a handler that returns immediately with a
    // slow stream never trips it, however long the stream itself takes.
    let harness = build(fixture, || async {
        let stream = futures::stream::unfold(0u8, |state| async move {
            match state {
                0 => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some((Ok::<_, std::io::Error>(Bytes::from_static(b"chunk")), 1))
                }
                1 => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Some((Ok(Bytes::from_static(b"done")), 2))
                }
                _ => None,
            }
        });

        Response::builder().status(StatusCode::OK).body(Body::from_stream(stream)).unwrap()
    })
    .await;

    let response = harness.app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let first_frame = tokio::time::timeout(Duration::from_millis(150), body.frame())
        .await
        .expect("first chunk must arrive well inside the deadline window")
        .expect("stream yields at least one frame")
        .expect("frame read must not error");

    assert_eq!(first_frame.into_data().unwrap(), Bytes::from_static(b"chunk"));
}
