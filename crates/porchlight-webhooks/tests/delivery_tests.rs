//! Integration tests for webhook delivery attempts.
//!
//! These drive the real `DeliveryExecutor` against mock HTTP servers and
//! verify request shape, signing, and status classification. No database
//! is required.

mod common;

use common::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use porchlight_webhooks::services::executor::DeliveryExecutor;

fn executor() -> DeliveryExecutor {
    DeliveryExecutor::new().expect("Failed to build executor")
}

#[tokio::test]
async fn test_delivery_sends_expected_headers() {
    let mock_server = MockServer::start().await;
    let responder = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(responder.clone())
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    let body = br#"{"event":"visitor.checked_in","data":{}}"#;
    let outcome = executor()
        .execute(&url, SECRET_1, body, "visitor.checked_in")
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.status, Some(200));

    let requests = responder.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert!(request
        .header("content-type")
        .expect("missing content-type")
        .starts_with("application/json"));
    assert_eq!(
        request.header("user-agent"),
        Some("Porchlight-Webhook/1.0")
    );
    assert_eq!(
        request.header("x-webhook-event"),
        Some("visitor.checked_in")
    );

    let signature = request
        .header("x-webhook-signature")
        .expect("missing signature header");
    assert_eq!(signature.len(), 64);
    assert!(signature
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

    // The test-probe marker must never appear on real deliveries.
    assert!(request.header("x-webhook-test").is_none());
}

#[tokio::test]
async fn test_delivery_signature_verifies_against_received_body() {
    let mock_server = MockServer::start().await;
    let responder = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(responder.clone())
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    let body = br#"{"event":"session.started","timestamp":"2026-08-21T10:00:00Z","data":{"session_id":"abc"}}"#;
    let outcome = executor()
        .execute(&url, SECRET_1, body, "session.started")
        .await;

    assert!(outcome.success);

    let requests = responder.requests();
    assert_eq!(requests.len(), 1);
    assert!(verify_captured_signature(&requests[0], SECRET_1));
    assert!(!verify_captured_signature(&requests[0], "wrong-secret"));
}

#[tokio::test]
async fn test_delivery_body_sent_verbatim() {
    let mock_server = MockServer::start().await;
    let responder = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(responder.clone())
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    // Key order and non-ASCII content must survive untouched, otherwise
    // the receiver's signature check fails.
    let body = "{\"b\":1,\"a\":\"caf\u{e9} & 進捗\"}".as_bytes();
    executor()
        .execute(&url, SECRET_1, body, "follow_up.sent")
        .await;

    let requests = responder.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, body);
}

#[tokio::test]
async fn test_delivery_accepts_2xx_and_3xx() {
    for status in [200u16, 204, 301, 399] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let url = format!("{}/webhook", mock_server.uri());
        let outcome = executor()
            .execute(&url, SECRET_1, b"{}", "visitor.checked_in")
            .await;

        assert!(outcome.success, "status {status} should count as accepted");
        assert_eq!(outcome.status, Some(status));
        assert!(outcome.error.is_none());
    }
}

#[tokio::test]
async fn test_delivery_does_not_follow_redirects() {
    let mock_server = MockServer::start().await;
    let target = CountingResponder::new();

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/elsewhere", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/elsewhere"))
        .respond_with(target.clone())
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    let outcome = executor()
        .execute(&url, SECRET_1, b"{}", "visitor.checked_in")
        .await;

    // The 3xx itself is treated as accepted; the Location is never chased,
    // so the signed payload is not replayed to an unvetted URL.
    assert!(outcome.success);
    assert_eq!(outcome.status, Some(301));
    assert_eq!(target.count(), 0);
}

#[tokio::test]
async fn test_delivery_fails_on_4xx_and_5xx() {
    for status in [400u16, 404, 500] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let url = format!("{}/webhook", mock_server.uri());
        let outcome = executor()
            .execute(&url, SECRET_1, b"{}", "visitor.checked_in")
            .await;

        assert!(!outcome.success, "status {status} should count as failed");
        assert_eq!(outcome.status, Some(status));
        assert_eq!(
            outcome.error.as_deref(),
            Some(format!("Endpoint returned status {status}").as_str())
        );
    }
}

#[tokio::test]
async fn test_delivery_reports_connection_failure() {
    // Grab a port that was just freed so nothing is listening on it.
    // (A pooled wiremock server keeps its listener open after drop, so a
    // plain TcpListener is bound and closed instead.)
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let url = format!("http://{}/webhook", listener.local_addr().expect("local addr"));
    drop(listener);

    let outcome = executor()
        .execute(&url, SECRET_1, b"{}", "visitor.checked_in")
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    let error = outcome.error.expect("expected a connection error");
    assert!(
        error.starts_with("Connection failed:"),
        "unexpected error: {error}"
    );
}
