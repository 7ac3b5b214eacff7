//! Integration tests for the tracked HTTP transport using wiremock
//!
//! These tests run the real reqwest transport against a mock backend to
//! verify duplicate blocking, pass-through of backend outcomes, and cleanup.

use crmdesk_egress::{
    CallTracker, EgressError, HttpClientConfig, HttpTransport, OutboundRequest, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string, header, method, path, query_param},
};

fn tracked_transport() -> (Arc<CallTracker>, Arc<dyn Transport>) {
    let tracker = Arc::new(CallTracker::new());
    let http = HttpTransport::new(&HttpClientConfig::default()).unwrap();
    let transport = tracker.install(Arc::new(http));
    (tracker, transport)
}

#[tokio::test]
async fn test_get_passes_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/leads"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"id": 1, "name": "Globex"}],
            "page": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (tracker, transport) = tracked_transport();

    let request = OutboundRequest::new(format!("{}/api/leads?page=2", mock_server.uri()));
    let response = transport.execute(request).await.unwrap();

    assert!(response.is_success());
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["items"][0]["name"], "Globex");
    assert_eq!(tracker.active_calls_count(), 0);
}

#[tokio::test]
async fn test_json_body_and_headers_are_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer token-1"))
        .and(body_json(serde_json::json!({"title": "Call back"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 9})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_tracker, transport) = tracked_transport();

    let request = OutboundRequest::post(format!("{}/api/tasks", mock_server.uri()))
        .with_json(serde_json::json!({"title": "Call back"}))
        .with_header(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Bearer token-1"),
        );

    let response = transport.execute(request).await.unwrap();
    assert_eq!(response.status.as_u16(), 201);
}

#[tokio::test]
async fn test_non_success_status_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/departments/4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let (tracker, transport) = tracked_transport();

    let request = OutboundRequest::new(format!("{}/api/departments/4", mock_server.uri()))
        .with_method(http::Method::DELETE);
    let response = transport.execute(request).await.unwrap();

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(response.text(), "not found");
    assert_eq!(tracker.active_calls_count(), 0);
}

#[tokio::test]
async fn test_concurrent_duplicate_reaches_backend_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/leads"))
        .and(body_string("name=Initech"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("created")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (tracker, transport) = tracked_transport();
    let url = format!("{}/api/leads", mock_server.uri());

    let first = tokio::spawn({
        let transport = transport.clone();
        let url = url.clone();
        async move {
            transport
                .execute(OutboundRequest::post(url).with_text("name=Initech"))
                .await
        }
    });

    // Wait until the first call is registered as in flight
    while tracker.active_calls_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = transport
        .execute(OutboundRequest::post(url.clone()).with_text("name=Initech"))
        .await;
    assert!(matches!(second, Err(EgressError::DuplicateCall { .. })));

    let response = first.await.unwrap().unwrap();
    assert_eq!(response.text(), "created");
    assert_eq!(tracker.active_calls_count(), 0);

    // MockServer verifies `expect(1)` on drop
}

#[tokio::test]
async fn test_connection_failure_propagates_and_releases() {
    let (tracker, transport) = tracked_transport();

    // Nothing listens on port 9 (discard) in the test environment
    let result = transport
        .execute(OutboundRequest::get("http://127.0.0.1:9/api/leads"))
        .await;

    assert!(matches!(result, Err(EgressError::HttpError(_))));
    assert_eq!(tracker.active_calls_count(), 0);
}
