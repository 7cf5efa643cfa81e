//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::realtime::RealtimeError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl AppError {
    /// HTTP status and numeric error code
    pub fn status_and_code(&self) -> (StatusCode, u16) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, 10002),
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, 10007),
            AppError::Internal(_) | AppError::Realtime(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 10000)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, errors) = match self {
            AppError::BadRequest(msg) => (msg, None),
            AppError::Validation { message, errors } => (message, Some(errors)),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".into(), None)
            }
            AppError::Realtime(e) => {
                tracing::error!("Realtime error: {}", e);
                ("Internal server error".into(), None)
            }
        };

        let body = ErrorResponse {
            code,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
