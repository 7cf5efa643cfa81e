//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Emit a domain event to a room
#[derive(Debug, Deserialize, Validate)]
pub struct EmitEventRequest {
    /// Room key, e.g. `channel:123`
    #[validate(length(min = 1, max = 200, message = "Room must be 1-200 characters"))]
    pub room: String,

    #[validate(length(min = 1, max = 64, message = "Event name must be 1-64 characters"))]
    pub event: String,

    #[serde(default)]
    pub payload: Value,
}
