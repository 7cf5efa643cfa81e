//! Client-side message record.
//!
//! Maps a message in a client's visible timeline, which may still be waiting
//! for server confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::ServerMessage;

/// Delivery status of a message in the local timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Submitted locally, network call in flight
    Sending,
    /// Matched with a server broadcast
    Confirmed,
    /// Network call errored; stays visible until the user retries
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message in the client's visible timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    /// Temporary id while unconfirmed, server id once confirmed
    pub id: String,

    /// Client-generated id, cleared on confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,

    pub content: String,

    /// Ordering key: submission time for optimistic entries, server time
    /// once confirmed
    pub created_at: DateTime<Utc>,

    pub status: DeliveryStatus,

    /// Server document fields carried through from the broadcast
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,

    /// Temporary id this confirmed entry replaced on content alone. The
    /// attribution may be wrong when identical messages are in flight, so it
    /// stays revisable until a response echoing a temporary id settles it.
    #[serde(skip)]
    pub provisional_ref: Option<String>,
}

impl ClientMessage {
    /// Optimistic entry created on submit.
    pub fn pending(temp_id: impl Into<String>, content: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        let temp_id = temp_id.into();
        Self {
            id: temp_id.clone(),
            temp_id: Some(temp_id),
            content: content.into(),
            created_at: submitted_at,
            status: DeliveryStatus::Sending,
            extra: Map::new(),
            provisional_ref: None,
        }
    }

    /// Entry built from a server broadcast.
    pub fn confirmed(message: ServerMessage) -> Self {
        Self {
            id: message.id,
            temp_id: None,
            content: message.content,
            created_at: message.created_at,
            status: DeliveryStatus::Confirmed,
            extra: message.extra,
            provisional_ref: None,
        }
    }

    /// Move an unconfirmed entry under another temporary id.
    pub fn reassign(&mut self, temp_id: impl Into<String>, status: DeliveryStatus) {
        let temp_id = temp_id.into();
        self.id = temp_id.clone();
        self.temp_id = Some(temp_id);
        self.status = status;
    }

    pub fn is_sending(&self) -> bool {
        self.status == DeliveryStatus::Sending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == DeliveryStatus::Confirmed
    }

    pub fn is_failed(&self) -> bool {
        self.status == DeliveryStatus::Failed
    }

    /// Check whether this entry was submitted under `temp_id`.
    pub fn has_temp_id(&self, temp_id: &str) -> bool {
        self.temp_id.as_deref() == Some(temp_id)
    }
}
