//! Event Emission API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn test_emit_reaches_channel_members() {
    let app = TestApp::new().await;
    let hub = &app.state.hub;
    let (member, mut rx_member) = hub.connect();
    let (other, mut rx_other) = hub.connect();
    hub.join_channel(member, "chan-1");
    hub.join_channel(other, "chan-2");
    // Drop the ready frames
    rx_member.recv().await.unwrap();
    rx_other.recv().await.unwrap();

    let body = json!({
        "room": "channel:chan-1",
        "event": "message",
        "payload": { "_id": "m1", "content": "hi" }
    });
    let (status, json) = json_body(app.post_json("/api/v1/events", &body.to_string()).await).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["delivered"], 1);

    let event = rx_member.recv().await.unwrap();
    assert_eq!(event.name, "message");
    assert_eq!(event.payload["content"], "hi");
    assert!(rx_other.try_recv().is_err());
}

#[tokio::test]
async fn test_emit_to_empty_room_delivers_nothing() {
    let app = TestApp::new().await;

    let body = json!({ "room": "channel:nobody", "event": "messageDeleted", "payload": "m1" });
    let (status, json) = json_body(app.post_json("/api/v1/events", &body.to_string()).await).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["delivered"], 0);
}

#[tokio::test]
async fn test_emit_before_initialization_fails() {
    let app = TestApp::uninitialized().await;

    let body = json!({ "room": "channel:1", "event": "message", "payload": {} });
    let (status, json) = json_body(app.post_json("/api/v1/events", &body.to_string()).await).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], 10000);
}

#[tokio::test]
async fn test_emit_validation_error() {
    let app = TestApp::new().await;

    let body = json!({ "room": "", "event": "message" });
    let (status, json) = json_body(app.post_json("/api/v1/events", &body.to_string()).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 10007);
    assert_eq!(json["errors"][0]["field"], "room");
}

#[tokio::test]
async fn test_emit_malformed_body() {
    let app = TestApp::new().await;

    let (status, json) = json_body(app.post_json("/api/v1/events", "{not json").await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 10002);
}
