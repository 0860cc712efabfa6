//! Integration tests for the webhook URL test probe.
//!
//! The probe is an unsigned POST with a marker header, used to verify an
//! endpoint before a configuration is created or updated.

mod common;

use common::*;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use porchlight_webhooks::services::executor::DeliveryExecutor;

fn executor() -> DeliveryExecutor {
    DeliveryExecutor::new().expect("Failed to build executor")
}

#[tokio::test]
async fn test_probe_sends_marker_header_and_test_payload() {
    let mock_server = MockServer::start().await;
    let responder = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(responder.clone())
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    let outcome = executor().probe(&url).await;

    assert!(outcome.success);
    assert_eq!(outcome.status, Some(200));

    let requests = responder.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.header("x-webhook-test"), Some("true"));
    assert!(request
        .header("content-type")
        .expect("missing content-type")
        .starts_with("application/json"));

    // Probes are unsigned: receivers have no secret to check them against
    // until the configuration exists.
    assert!(request.header("x-webhook-signature").is_none());

    let body: Value = request.body_json().expect("probe body is not JSON");
    assert_eq!(body["event"], "webhook.test");
    assert_eq!(body["data"]["message"], "This is a test webhook from Porchlight");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_probe_accepts_any_status_below_400() {
    for status in [200u16, 204, 302, 399] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let url = format!("{}/webhook", mock_server.uri());
        let outcome = executor().probe(&url).await;

        assert!(outcome.success, "status {status} should pass the probe");
        assert!(outcome.error.is_none());
    }
}

#[tokio::test]
async fn test_probe_fails_on_error_status() {
    for status in [400u16, 404, 500] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let url = format!("{}/webhook", mock_server.uri());
        let outcome = executor().probe(&url).await;

        assert!(!outcome.success, "status {status} should fail the probe");
        assert_eq!(
            outcome.error.as_deref(),
            Some(format!("Endpoint returned status {status}").as_str())
        );
    }
}

#[tokio::test]
async fn test_probe_reports_connection_failure() {
    // Grab a port that was just freed so nothing is listening on it.
    // (A pooled wiremock server keeps its listener open after drop, so a
    // plain TcpListener is bound and closed instead.)
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let url = format!("http://{}/webhook", listener.local_addr().expect("local addr"));
    drop(listener);

    let outcome = executor().probe(&url).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    let error = outcome.error.expect("expected a connection error");
    assert!(
        error.starts_with("Connection failed:"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn test_probe_times_out_after_five_seconds() {
    let mock_server = MockServer::start().await;

    // Respond slower than the probe timeout. This test takes ~5s to run.
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(DelayedResponder::new(6_000))
        .mount(&mock_server)
        .await;

    let url = format!("{}/webhook", mock_server.uri());
    let outcome = executor().probe(&url).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Request timed out after 5 seconds")
    );
}
