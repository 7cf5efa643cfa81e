//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::Serialize;

/// Result of an emit
#[derive(Debug, Serialize)]
pub struct EmitEventResponse {
    /// Connections the event was queued for
    pub delivered: usize,
}

/// Room membership diagnostics
#[derive(Debug, Serialize)]
pub struct RoomMembersResponse {
    pub room: String,
    pub member_count: usize,
    pub connections: Vec<String>,
    /// Users announced in the room (server rooms only)
    pub online_users: Vec<String>,
}
