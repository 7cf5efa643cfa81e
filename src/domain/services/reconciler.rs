//! Optimistic send reconciliation.
//!
//! A client shows its own messages immediately, before the server has
//! accepted them, and later receives the same message back as a broadcast.
//! `Reconciler::reconcile` folds both kinds of input into one timeline
//! without duplicates. It is a pure function of `(timeline, event)` so it can
//! be driven from any event loop and tested without a network.
//!
//! ## Matching
//!
//! An incoming confirmed message is matched against local entries in this
//! order:
//!
//! 1. If a confirmed entry with the same server id already exists, the event
//!    is a duplicate. Its echoed temporary id, if any, is still used to settle
//!    a content-based attribution (see below).
//! 2. If the message echoes the temporary id it was submitted with
//!    (`client_ref`), the unconfirmed entry with that temporary id is
//!    confirmed.
//! 3. Otherwise the first `sending` entry with identical content is
//!    confirmed, and the entry remembers which temporary id it consumed.
//! 4. Otherwise the message is inserted at its timestamp position.
//!
//! Content matching can pick the wrong entry when identical messages are in
//! flight at once. When a later echo or failure shows the attribution was
//! wrong, the remaining unconfirmed entry of the same content is swapped
//! over to the temporary id that was consumed, so every submission still
//! ends up confirmed or failed exactly once.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{event_names, ClientMessage, DeliveryStatus, DomainEvent, ServerMessage};

/// Ordered, visible message sequence of one client view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    messages: Vec<ClientMessage>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from already-confirmed history.
    pub fn from_history(history: Vec<ServerMessage>) -> Self {
        let mut messages: Vec<ClientMessage> =
            history.into_iter().map(ClientMessage::confirmed).collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Self { messages }
    }

    pub fn messages(&self) -> &[ClientMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ClientMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Entries still waiting for confirmation.
    pub fn pending(&self) -> impl Iterator<Item = &ClientMessage> {
        self.messages.iter().filter(|m| m.is_sending())
    }

    fn insert_ordered(&mut self, message: ClientMessage) {
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
    }

    fn position_of_confirmed(&self, id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.is_confirmed() && m.id == id)
    }

    fn position_of_temp(&self, temp_id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.has_temp_id(temp_id))
    }

    fn position_of_unconfirmed(&self, temp_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| !m.is_confirmed() && m.has_temp_id(temp_id))
    }

    fn position_of_provisional(&self, temp_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.is_confirmed() && m.provisional_ref.as_deref() == Some(temp_id))
    }

    fn position_of_sending_content(&self, content: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.is_sending() && m.content == content)
    }
}

/// Input to the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// The user submitted a message; shown immediately as `sending`.
    Submitted {
        temp_id: String,
        content: String,
        submitted_at: DateTime<Utc>,
    },
    /// The server broadcast a new message.
    Confirmed(ServerMessage),
    /// The network call for a submitted message failed.
    SendFailed { temp_id: String },
    /// The user retried a failed message.
    Retried { temp_id: String },
    /// The server broadcast an edit or a reaction change.
    Updated(ServerMessage),
    /// The server broadcast a deletion.
    Deleted { id: String },
}

impl TimelineEvent {
    /// Translate a broadcast frame into a timeline event.
    ///
    /// Returns `None` for events that do not affect the message timeline
    /// (presence, typing, moderation) and for payloads that do not parse.
    pub fn from_domain_event(event: &DomainEvent) -> Option<Self> {
        match event.name.as_str() {
            event_names::MESSAGE | event_names::NEW_MESSAGE => {
                ServerMessage::deserialize(&event.payload)
                    .ok()
                    .map(Self::Confirmed)
            }
            event_names::MESSAGE_UPDATED | event_names::REACTION_UPDATED => {
                ServerMessage::deserialize(&event.payload)
                    .ok()
                    .map(Self::Updated)
            }
            event_names::MESSAGE_DELETED => event
                .payload
                .as_str()
                .map(|id| Self::Deleted { id: id.to_string() }),
            _ => None,
        }
    }
}

/// Stateless reconciliation of a client timeline.
pub struct Reconciler;

impl Reconciler {
    /// Apply one event to a timeline.
    pub fn reconcile(mut timeline: Timeline, event: TimelineEvent) -> Timeline {
        match event {
            TimelineEvent::Submitted {
                temp_id,
                content,
                submitted_at,
            } => {
                if timeline.position_of_temp(&temp_id).is_none() {
                    timeline.insert_ordered(ClientMessage::pending(temp_id, content, submitted_at));
                }
            }

            TimelineEvent::Confirmed(message) => Self::confirm(&mut timeline, message),

            TimelineEvent::SendFailed { temp_id } => {
                if !Self::transition(&mut timeline, &temp_id, DeliveryStatus::Sending, DeliveryStatus::Failed) {
                    Self::fail_consumed(&mut timeline, &temp_id);
                }
            }

            TimelineEvent::Retried { temp_id } => {
                Self::transition(&mut timeline, &temp_id, DeliveryStatus::Failed, DeliveryStatus::Sending);
            }

            TimelineEvent::Updated(message) => {
                if let Some(index) = timeline.position_of_confirmed(&message.id) {
                    timeline.messages[index] = ClientMessage::confirmed(message);
                }
            }

            TimelineEvent::Deleted { id } => {
                timeline.messages.retain(|m| !(m.is_confirmed() && m.id == id));
            }
        }

        timeline
    }

    fn confirm(timeline: &mut Timeline, message: ServerMessage) {
        if let Some(index) = timeline.position_of_confirmed(&message.id) {
            if let Some(client_ref) = &message.client_ref {
                Self::settle(timeline, index, client_ref);
            }
            return;
        }

        match message.client_ref.clone() {
            Some(client_ref) => {
                if let Some(index) = timeline.position_of_unconfirmed(&client_ref) {
                    timeline.messages[index] = ClientMessage::confirmed(message);
                } else if let Some(index) = timeline.position_of_provisional(&client_ref) {
                    Self::reclaim(timeline, index, message);
                } else {
                    timeline.insert_ordered(ClientMessage::confirmed(message));
                }
            }
            None => match timeline.position_of_sending_content(&message.content) {
                Some(index) => {
                    let consumed = timeline.messages[index].temp_id.clone();
                    let mut entry = ClientMessage::confirmed(message);
                    entry.provisional_ref = consumed;
                    timeline.messages[index] = entry;
                }
                None => timeline.insert_ordered(ClientMessage::confirmed(message)),
            },
        }
    }

    /// An already confirmed entry turns out to belong to `client_ref`.
    ///
    /// If it had consumed another temporary id on content alone, the entry
    /// still waiting under `client_ref` takes that id over.
    fn settle(timeline: &mut Timeline, index: usize, client_ref: &str) {
        let consumed = timeline.messages[index].provisional_ref.take();
        if consumed.as_deref() == Some(client_ref) {
            return;
        }

        if let Some(waiting) = timeline.position_of_unconfirmed(client_ref) {
            match consumed {
                Some(temp_id) => timeline.messages[waiting].reassign(temp_id, DeliveryStatus::Sending),
                None => {
                    timeline.messages.remove(waiting);
                }
            }
        }
    }

    /// `message` belongs to a temporary id that the confirmed entry at
    /// `index` consumed on content alone. The new message takes the slot of
    /// another sending entry with the same content, which the confirmed
    /// entry is now attributed to instead.
    fn reclaim(timeline: &mut Timeline, index: usize, message: ServerMessage) {
        let content = timeline.messages[index].content.clone();

        match timeline.position_of_sending_content(&content) {
            Some(waiting) => {
                timeline.messages[index].provisional_ref = timeline.messages[waiting].temp_id.clone();
                timeline.messages[waiting] = ClientMessage::confirmed(message);
            }
            None => {
                timeline.messages[index].provisional_ref = None;
                timeline.insert_ordered(ClientMessage::confirmed(message));
            }
        }
    }

    /// The send under `temp_id` failed, but a confirmed entry consumed it on
    /// content alone. Another sending entry of the same content takes over
    /// the failed id; without one, the failed message is restored.
    fn fail_consumed(timeline: &mut Timeline, temp_id: &str) {
        let Some(index) = timeline.position_of_provisional(temp_id) else {
            return;
        };
        let content = timeline.messages[index].content.clone();

        match timeline.position_of_sending_content(&content) {
            Some(waiting) => {
                timeline.messages[index].provisional_ref = timeline.messages[waiting].temp_id.clone();
                timeline.messages[waiting].reassign(temp_id, DeliveryStatus::Failed);
            }
            None => {
                let created_at = timeline.messages[index].created_at;
                timeline.messages[index].provisional_ref = None;

                let mut failed = ClientMessage::pending(temp_id, content, created_at);
                failed.status = DeliveryStatus::Failed;
                timeline.insert_ordered(failed);
            }
        }
    }

    fn transition(timeline: &mut Timeline, temp_id: &str, from: DeliveryStatus, to: DeliveryStatus) -> bool {
        match timeline
            .messages
            .iter_mut()
            .find(|m| m.has_temp_id(temp_id) && m.status == from)
        {
            Some(entry) => {
                entry.status = to;
                true
            }
            None => false,
        }
    }
}
