//! Room Diagnostics API Tests

use axum::http::StatusCode;
use chat_realtime::domain::UserId;

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn test_room_members_of_server_room() {
    let app = TestApp::new().await;
    let hub = &app.state.hub;
    let (a, _rx_a) = hub.connect();
    let (b, _rx_b) = hub.connect();
    hub.join_server(a, "s1", &UserId::new("bob"));
    hub.join_server(b, "s1", &UserId::new("alice"));

    let (status, json) = json_body(app.get("/api/v1/rooms/server:s1/members").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["room"], "server:s1");
    assert_eq!(json["member_count"], 2);
    assert_eq!(json["online_users"], serde_json::json!(["alice", "bob"]));
}

#[tokio::test]
async fn test_room_members_of_unknown_room() {
    let app = TestApp::new().await;

    let (status, json) = json_body(app.get("/api/v1/rooms/channel:none/members").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["member_count"], 0);
    assert_eq!(json["online_users"], serde_json::json!([]));
}
