//! Server-confirmed message as broadcast to clients.
//!
//! The persistence layer owns the full message document; the realtime core
//! only needs the identity, content and creation time. Every other field is
//! carried through untouched in `extra`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message as it appears in a `message` / `newMessage` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// Server-assigned identifier
    #[serde(alias = "_id")]
    pub id: String,

    /// Message text
    pub content: String,

    /// Persistence timestamp
    pub created_at: DateTime<Utc>,

    /// Temporary id the sender submitted with, when the server echoes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,

    /// Remaining document fields (author, reactions, thread, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerMessage {
    pub fn new(id: impl Into<String>, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            created_at,
            client_ref: None,
            extra: Map::new(),
        }
    }

    /// Attach the submitting client's temporary id.
    pub fn with_client_ref(mut self, client_ref: impl Into<String>) -> Self {
        self.client_ref = Some(client_ref.into());
        self
    }
}
