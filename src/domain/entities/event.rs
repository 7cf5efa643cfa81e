//! Domain events.
//!
//! A `DomainEvent` is the unit of fan-out: an event name from the wire
//! vocabulary plus a JSON body. It is built after the mutation that produced
//! it has committed and lives only for the duration of dispatch.
//!
//! Events serialize directly as the wire frame `{"event": ..., "data": ...}`.
//! Single-argument events carry the argument itself as `data`; events with
//! several arguments carry an object.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::value_objects::{ConnectionId, UserId};

/// Event names. These are part of the wire contract.
pub mod names {
    pub const USER_CONNECTED: &str = "user-connected";
    pub const USER_DISCONNECTED: &str = "user-disconnected";
    pub const TYPING: &str = "typing";
    pub const STOP_TYPING: &str = "stop-typing";

    pub const MESSAGE: &str = "message";
    pub const MESSAGE_UPDATED: &str = "messageUpdated";
    pub const MESSAGE_DELETED: &str = "messageDeleted";
    pub const REACTION_UPDATED: &str = "reactionUpdated";

    pub const THREAD_CREATED: &str = "threadCreated";
    pub const THREAD_UPDATED: &str = "threadUpdated";
    pub const THREAD_DELETED: &str = "threadDeleted";

    pub const MEMBER_BANNED: &str = "memberBanned";
    pub const MEMBER_MUTED: &str = "memberMuted";

    // Direct-message room variants
    pub const NEW_MESSAGE: &str = "newMessage";
    pub const CONVERSATION_UPDATED: &str = "conversationUpdated";

    // Connection-scoped
    pub const READY: &str = "ready";
    pub const ERROR: &str = "error";
}

/// A named event payload ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(rename = "data")]
    pub payload: Value,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn user_connected(user_id: &UserId, timestamp_ms: i64) -> Self {
        Self::new(
            names::USER_CONNECTED,
            json!({ "userId": user_id, "timestamp": timestamp_ms }),
        )
    }

    pub fn user_disconnected(user_id: &UserId, timestamp_ms: i64) -> Self {
        Self::new(
            names::USER_DISCONNECTED,
            json!({ "userId": user_id, "timestamp": timestamp_ms }),
        )
    }

    pub fn typing(user_id: &UserId) -> Self {
        Self::new(names::TYPING, json!(user_id))
    }

    pub fn stop_typing(user_id: &UserId) -> Self {
        Self::new(names::STOP_TYPING, json!(user_id))
    }

    /// New channel message. `message` is the persisted message document.
    pub fn message(message: Value) -> Self {
        Self::new(names::MESSAGE, message)
    }

    pub fn message_updated(message: Value) -> Self {
        Self::new(names::MESSAGE_UPDATED, message)
    }

    pub fn message_deleted(message_id: &str) -> Self {
        Self::new(names::MESSAGE_DELETED, json!(message_id))
    }

    pub fn reaction_updated(message: Value) -> Self {
        Self::new(names::REACTION_UPDATED, message)
    }

    pub fn thread_created(thread: Value) -> Self {
        Self::new(names::THREAD_CREATED, thread)
    }

    pub fn thread_updated(thread: Value) -> Self {
        Self::new(names::THREAD_UPDATED, thread)
    }

    pub fn thread_deleted(thread_id: &str) -> Self {
        Self::new(names::THREAD_DELETED, json!(thread_id))
    }

    pub fn member_banned(user_to_ban_id: &UserId, server_id: &str) -> Self {
        Self::new(
            names::MEMBER_BANNED,
            json!({ "userToBanId": user_to_ban_id, "serverId": server_id }),
        )
    }

    /// `expires_at` is `None` for an indefinite mute.
    pub fn member_muted(
        user_to_mute_id: &UserId,
        server_id: &str,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Self {
        Self::new(
            names::MEMBER_MUTED,
            json!({
                "userToMuteId": user_to_mute_id,
                "serverId": server_id,
                "expiresAt": expires_at.map(|t| t.to_rfc3339()),
            }),
        )
    }

    /// New direct message.
    pub fn new_message(message: Value) -> Self {
        Self::new(names::NEW_MESSAGE, message)
    }

    pub fn conversation_updated(conversation: Value) -> Self {
        Self::new(names::CONVERSATION_UPDATED, conversation)
    }

    pub fn ready(connection_id: ConnectionId) -> Self {
        Self::new(names::READY, json!({ "connectionId": connection_id.value() }))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(names::ERROR, json!({ "message": message.into() }))
    }
}
