//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::presentation::middleware::track_http_metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_http_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> Result<impl IntoResponse, AppError> {
    let metrics = metrics::gather_metrics()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    ))
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(handlers::events::emit_event))
        .route("/rooms/{room}/members", get(handlers::rooms::get_room_members))
}
