//! Health Check API Tests

use axum::http::StatusCode;

use crate::common::{json_body, TestApp};

/// Test basic health check endpoint returns 200 OK with status
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let (status, json) = json_body(app.get("/health").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::uninitialized().await;

    let (status, json) = json_body(app.get("/health/live").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "alive");
}

/// Readiness reports the realtime core once the dispatcher is up
#[tokio::test]
async fn test_readiness_probe_when_initialized() {
    let app = TestApp::new().await;
    let (_connection, _rx) = app.state.hub.connect();

    let (status, json) = json_body(app.get("/health/ready").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["realtime"]["dispatcher_initialized"], true);
    assert_eq!(json["realtime"]["active_connections"], 1);
}

/// Readiness fails before the dispatcher is initialized
#[tokio::test]
async fn test_readiness_probe_before_initialization() {
    let app = TestApp::uninitialized().await;

    let (status, json) = json_body(app.get("/health/ready").await).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
}

/// Metrics endpoint exposes the realtime gauges
#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new().await;
    let (_connection, _rx) = app.state.hub.connect();

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("chat_realtime_connections_active"));
}
