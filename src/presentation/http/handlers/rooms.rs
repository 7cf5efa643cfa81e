//! Room Handlers
//!
//! Membership diagnostics.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::RoomMembersResponse;
use crate::domain::{RoomKey, RoomNamespace};
use crate::startup::AppState;

/// Get current members of a room
///
/// GET /api/v1/rooms/{room}/members
pub async fn get_room_members(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Json<RoomMembersResponse> {
    let room = RoomKey::new(room);
    let connections = state.hub.registry().members_of(&room);

    let online_users = match room.namespace() {
        Some(RoomNamespace::Server) => state
            .hub
            .presence()
            .online_users(&room)
            .into_iter()
            .map(|user| user.to_string())
            .collect(),
        _ => Vec::new(),
    };

    Json(RoomMembersResponse {
        room: room.to_string(),
        member_count: connections.len(),
        connections: connections.iter().map(|c| c.to_string()).collect(),
        online_users,
    })
}
