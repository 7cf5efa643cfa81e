//! Room keys.
//!
//! A room is nothing more than the set of connections that joined a key.
//! Keys built from domain entities always carry a namespace prefix so a
//! server, a channel and a conversation that share a raw id never share a
//! room:
//!
//! ```text
//! server:<id>        presence events
//! channel:<id>       chat, thread and typing events
//! conversation:<id>  direct-message events
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace a room key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomNamespace {
    Server,
    Channel,
    Conversation,
}

impl RoomNamespace {
    /// Key prefix, including the separator.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Server => "server:",
            Self::Channel => "channel:",
            Self::Conversation => "conversation:",
        }
    }
}

/// Key identifying one broadcast room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Wrap a fully-formed key verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Room for server-scoped (presence, moderation) events.
    pub fn server(server_id: &str) -> Self {
        Self::namespaced(RoomNamespace::Server, server_id)
    }

    /// Room for channel-scoped (chat, thread, typing) events.
    pub fn channel(channel_id: &str) -> Self {
        Self::namespaced(RoomNamespace::Channel, channel_id)
    }

    /// Room for direct-message events.
    pub fn conversation(conversation_id: &str) -> Self {
        Self::namespaced(RoomNamespace::Conversation, conversation_id)
    }

    fn namespaced(namespace: RoomNamespace, id: &str) -> Self {
        Self(format!("{}{}", namespace.prefix(), id))
    }

    /// Namespace of this key, if it was built from a domain entity.
    pub fn namespace(&self) -> Option<RoomNamespace> {
        [
            RoomNamespace::Server,
            RoomNamespace::Channel,
            RoomNamespace::Conversation,
        ]
        .into_iter()
        .find(|ns| self.0.starts_with(ns.prefix()))
    }

    /// Entity id without the namespace prefix.
    pub fn entity_id(&self) -> &str {
        match self.namespace() {
            Some(ns) => &self.0[ns.prefix().len()..],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoomKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
