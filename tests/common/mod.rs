//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use chat_realtime::config::{
    CorsSettings, RealtimeSettings, ServerSettings, Settings, WebSocketSettings,
};
use chat_realtime::startup::{build_router, AppState};

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application with an initialized dispatcher
    pub async fn new() -> Self {
        let app = Self::uninitialized().await;
        app.state
            .hub
            .initialize()
            .expect("dispatcher should initialize once");
        app
    }

    /// Create a test application whose dispatcher is not yet initialized
    pub async fn uninitialized() -> Self {
        let state = AppState::new(test_settings());
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Settings for tests, independent of config files and environment
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        websocket: WebSocketSettings {
            max_message_size: 65536,
            max_frame_size: 16384,
        },
        realtime: RealtimeSettings {
            typing_timeout_ms: 3000,
        },
        environment: "test".into(),
    }
}

/// Split a response into status and parsed JSON body
pub async fn json_body(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
