//! WebSocket Message Types
//!
//! Every frame in either direction is a JSON object
//! `{"event": <name>, "data": <payload>}`. Outgoing frames are
//! [`DomainEvent`](crate::domain::DomainEvent)s serialized as-is; incoming
//! frames are parsed into [`ClientFrame`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Client to server frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Join a server room and announce presence
    JoinServer(JoinServerPayload),
    LeaveServer(ServerPayload),
    JoinChannel(ChannelPayload),
    LeaveChannel(ChannelPayload),
    JoinConversation(ConversationPayload),
    LeaveConversation(ConversationPayload),
    /// User is typing in a channel
    Typing(TypingPayload),
}

/// Frame parse errors
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Event name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientFrame::JoinServer(_) => "join-server",
            ClientFrame::LeaveServer(_) => "leave-server",
            ClientFrame::JoinChannel(_) => "join-channel",
            ClientFrame::LeaveChannel(_) => "leave-channel",
            ClientFrame::JoinConversation(_) => "join-conversation",
            ClientFrame::LeaveConversation(_) => "leave-conversation",
            ClientFrame::Typing(_) => "typing",
        }
    }
}

/// `join-server` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinServerPayload {
    #[serde(deserialize_with = "id_string")]
    pub server_id: String,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPayload {
    #[serde(deserialize_with = "id_string")]
    pub server_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPayload {
    #[serde(deserialize_with = "id_string")]
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPayload {
    #[serde(deserialize_with = "id_string")]
    pub conversation_id: String,
}

/// `typing` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(deserialize_with = "id_string")]
    pub channel_id: String,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
}

/// Accept ids sent either as strings or as numbers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a non-empty string or number id, got {}",
            other
        ))),
    }
}
