//! End-to-end router tests against a wiremock backend
//!
//! One mock server plays both the CRM backend and the tenant verification
//! service; requests are driven through the full router with `oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use crmdesk_egress::{CallTracker, HttpClientConfig, HttpTransport, Transport};
use crmdesk_observability::Metrics;
use crmdesk_server::{AppState, ServerConfig, build_router};
use crmdesk_theme::{TenantVerifier, ThemeResolver};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, method, path, query_param},
};

struct TestApp {
    router: Router,
    tracker: Arc<CallTracker>,
}

fn test_app(mock_server: &MockServer) -> TestApp {
    let mut config = ServerConfig::default();
    config.backend.base_url = mock_server.uri();
    config.theme.verify_url = format!("{}/api/tenant/verify", mock_server.uri());
    config.theme.app_name = "Acme CRM".to_string();

    let http: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&HttpClientConfig::default()).unwrap());
    let verifier = TenantVerifier::new(http.clone(), config.theme.verify_url.clone());
    let themes = ThemeResolver::new(verifier, config.theme.resolver_config());
    let tracker = Arc::new(CallTracker::new());
    let metrics = Arc::new(Metrics::new().unwrap());

    let state = AppState::new(config, tracker.clone(), http, themes, metrics);
    TestApp {
        router: build_router(state),
        tracker,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn mount_acme_verification(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tenant/verify"))
        .and(query_param("subDomainName", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "isSuccess": true,
            "message": "ok",
            "data": {
                "logoUrl": "https://cdn.example.com/acme.svg",
                "whiteLabelData": {
                    "brandSettings": { "primaryColor": "#808080" },
                    "topBanner": "Welcome to Acme"
                }
            }
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_shell_inlines_tenant_theme() {
    let mock_server = MockServer::start().await;
    mount_acme_verification(&mock_server).await;
    let app = test_app(&mock_server);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<title>Acme CRM</title>"));
    assert!(html.contains("--primary-color: #808080;"));
    assert!(html.contains("--button-hover-color: #666666;"));
    assert!(html.contains("https://cdn.example.com/acme.svg"));
    assert!(html.contains("Welcome to Acme"));
}

#[tokio::test]
async fn test_deep_link_renders_shell() {
    let mock_server = MockServer::start().await;
    mount_acme_verification(&mock_server).await;
    let app = test_app(&mock_server);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/contacts/42")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("--primary-color: #808080;"));
}

#[tokio::test]
async fn test_theme_css_falls_back_when_verification_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tenant/verify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    let app = test_app(&mock_server);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/theme.css")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );
    let css = body_text(response).await;
    assert!(css.starts_with(":root {"));
    assert!(css.contains("--primary-color: #3b3b3b;"));
}

#[tokio::test]
async fn test_non_get_shell_is_rejected() {
    let mock_server = MockServer::start().await;
    let app = test_app(&mock_server);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_api_passthrough() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leads"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(r#"{"error":"no such page"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let app = test_app(&mock_server);

    let request = get("/api/leads?page=2");
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_text(response).await, r#"{"error":"no such page"}"#);
    assert_eq!(app.tracker.active_calls_count(), 0);
}

#[tokio::test]
async fn test_concurrent_duplicate_api_call_conflicts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/leads"))
        .and(body_string(r#"{"name":"Acme"}"#))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(r#"{"id":1}"#)
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let app = test_app(&mock_server);

    let post = || {
        Request::builder()
            .method("POST")
            .uri("/api/leads")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Acme"}"#))
            .unwrap()
    };

    let first = tokio::spawn(app.router.clone().oneshot(post()));

    // Wait until the first call is registered as in flight
    for _ in 0..100 {
        if app.tracker.active_calls_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.tracker.active_calls_count(), 1);

    let second = app.router.clone().oneshot(post()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json: serde_json::Value = serde_json::from_str(&body_text(second).await).unwrap();
    assert_eq!(json["error"], "duplicate_call");
    assert!(json["message"].as_str().unwrap().contains("POST:"));

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(app.tracker.active_calls_count(), 0);

    let metrics = app.router.oneshot(get("/metrics")).await.unwrap();
    let text = body_text(metrics).await;
    assert!(text.contains("crmdesk_duplicate_calls_blocked_total 1"));
    assert!(text.contains("crmdesk_active_outbound_calls 0"));
}

#[tokio::test]
async fn test_internal_calls_endpoints() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;
    let app = test_app(&mock_server);

    let slow = || get("/api/reports/slow");
    let first = tokio::spawn(app.router.clone().oneshot(slow()));

    for _ in 0..100 {
        if app.tracker.active_calls_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let response = app
        .router
        .clone()
        .oneshot(get("/internal/calls"))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["active_calls"], 1);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/internal/calls")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["cleared"], 1);

    // Cleared, so an identical call goes through while the first still runs
    let second = app.router.clone().oneshot(slow()).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(first.await.unwrap().unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let mut config = ServerConfig::default();
    config.backend.base_url = "http://127.0.0.1:9".to_string();
    config.theme.verify_url = "http://127.0.0.1:9/api/tenant/verify".to_string();

    let metrics = Arc::new(Metrics::new().unwrap());
    let app = build_router(AppState::from_config(config, metrics).unwrap());

    let response = app.clone().oneshot(get("/api/leads")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "bad_gateway");

    // The shell still renders with the default theme
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("--primary-color: #3b3b3b;"));
}

#[tokio::test]
async fn test_health_endpoints_mounted() {
    let mock_server = MockServer::start().await;
    let app = test_app(&mock_server);

    let response = app.router.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["components"].as_array().unwrap().len(), 3);
}
