//! Event Fan-out Dispatcher
//!
//! Delivers domain events to every member connection of a room. Delivery is
//! fire-and-forget: each member has an unbounded outbound queue drained by
//! its socket writer task, and a member whose queue is gone is skipped
//! without affecting the others.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::registry::RoomRegistry;
use crate::domain::{ConnectionId, DomainEvent, RoomKey};
use crate::infrastructure::metrics;

/// Event as queued for a connection. Shared between all recipients.
pub type OutboundEvent = Arc<DomainEvent>;

/// Sending half of a connection's outbound queue.
pub type ConnectionSender = mpsc::UnboundedSender<OutboundEvent>;

/// Receiving half of a connection's outbound queue.
pub type ConnectionReceiver = mpsc::UnboundedReceiver<OutboundEvent>;

/// Fan-out of events to room members.
pub struct Dispatcher {
    registry: Arc<RoomRegistry>,
    /// Outbound queue of each live connection
    connections: DashMap<ConnectionId, ConnectionSender>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            connections: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Register the outbound queue of a newly opened connection.
    pub fn register_connection(&self, connection: ConnectionId, sender: ConnectionSender) {
        self.connections.insert(connection, sender);
        metrics::set_connections_active(self.connections.len());

        tracing::debug!(connection_id = %connection, "Connection registered");
    }

    /// Drop the outbound queue of a closed connection.
    pub fn unregister_connection(&self, connection: ConnectionId) -> bool {
        let removed = self.connections.remove(&connection).is_some();
        metrics::set_connections_active(self.connections.len());

        if removed {
            tracing::debug!(connection_id = %connection, "Connection unregistered");
        }

        removed
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver an event to every member of a room.
    ///
    /// Members are resolved at call time. Emitting to an empty or unknown
    /// room is a no-op. Returns the number of connections the event was
    /// queued for.
    pub fn emit(&self, room: &RoomKey, event: DomainEvent) -> usize {
        self.fan_out(room, None, event)
    }

    /// Deliver an event to every member of a room except `exclude`.
    pub fn emit_except(&self, room: &RoomKey, exclude: ConnectionId, event: DomainEvent) -> usize {
        self.fan_out(room, Some(exclude), event)
    }

    /// Deliver an event to a single connection.
    pub fn emit_to(&self, connection: ConnectionId, event: DomainEvent) -> bool {
        let event = Arc::new(event);
        let delivered = self.deliver(connection, &event);
        metrics::record_event_dispatched(&event.name, usize::from(delivered));
        delivered
    }

    fn fan_out(&self, room: &RoomKey, exclude: Option<ConnectionId>, event: DomainEvent) -> usize {
        let members = self.registry.members_of(room);
        let event = Arc::new(event);

        let delivered = members
            .into_iter()
            .filter(|member| Some(*member) != exclude)
            .filter(|member| self.deliver(*member, &event))
            .count();

        tracing::debug!(
            room = %room,
            event = %event.name,
            delivered = delivered,
            "Event dispatched"
        );
        metrics::record_event_dispatched(&event.name, delivered);

        delivered
    }

    fn deliver(&self, connection: ConnectionId, event: &OutboundEvent) -> bool {
        let Some(sender) = self.connections.get(&connection) else {
            // Joined but already torn down
            tracing::debug!(connection_id = %connection, "Connection not found, skipping");
            metrics::record_delivery("dropped");
            return false;
        };

        match sender.send(Arc::clone(event)) {
            Ok(()) => {
                metrics::record_delivery("queued");
                true
            }
            Err(_) => {
                tracing::warn!(
                    connection_id = %connection,
                    event = %event.name,
                    "Outbound queue closed, dropping event"
                );
                metrics::record_delivery("dropped");
                false
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup() -> (Arc<RoomRegistry>, Dispatcher) {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        (registry, dispatcher)
    }

    fn connect(dispatcher: &Dispatcher, id: u64) -> (ConnectionId, ConnectionReceiver) {
        let connection = ConnectionId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();
        dispatcher.register_connection(connection, tx);
        (connection, rx)
    }

    #[tokio::test]
    async fn test_emit_reaches_room_members_only() {
        let (registry, dispatcher) = setup();
        let (a, mut rx_a) = connect(&dispatcher, 1);
        let (b, mut rx_b) = connect(&dispatcher, 2);
        let (c, mut rx_c) = connect(&dispatcher, 3);
        registry.join(a, &RoomKey::new("chan-1"));
        registry.join(b, &RoomKey::new("chan-1"));
        registry.join(c, &RoomKey::new("chan-2"));

        let delivered = dispatcher.emit(
            &RoomKey::new("chan-1"),
            DomainEvent::message(json!({ "content": "hi" })),
        );

        assert_eq!(delivered, 2);
        assert_eq!(rx_a.recv().await.unwrap().payload, json!({ "content": "hi" }));
        assert_eq!(rx_b.recv().await.unwrap().payload, json!({ "content": "hi" }));
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_to_unknown_room_is_noop() {
        let (_registry, dispatcher) = setup();
        let delivered = dispatcher.emit(&RoomKey::new("empty"), DomainEvent::message_deleted("m1"));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_late_joiner_does_not_receive_earlier_event() {
        let (registry, dispatcher) = setup();
        let room = RoomKey::new("chan-1");
        let (a, mut rx_a) = connect(&dispatcher, 1);
        let (b, mut rx_b) = connect(&dispatcher, 2);
        registry.join(a, &room);

        dispatcher.emit(&room, DomainEvent::message_deleted("m1"));
        registry.join(b, &room);

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_member_does_not_block_others() {
        let (registry, dispatcher) = setup();
        let room = RoomKey::new("chan-1");
        let (a, rx_a) = connect(&dispatcher, 1);
        let (b, mut rx_b) = connect(&dispatcher, 2);
        registry.join(a, &room);
        registry.join(b, &room);
        drop(rx_a);

        let delivered = dispatcher.emit(&room, DomainEvent::message_deleted("m1"));

        assert_eq!(delivered, 1);
        assert_eq!(rx_b.recv().await.unwrap().name, "messageDeleted");
    }

    #[tokio::test]
    async fn test_unregistered_member_is_skipped() {
        let (registry, dispatcher) = setup();
        let room = RoomKey::new("chan-1");
        registry.join(ConnectionId::new(99), &room);

        assert_eq!(dispatcher.emit(&room, DomainEvent::message_deleted("m1")), 0);
    }

    #[tokio::test]
    async fn test_emit_except_skips_origin() {
        let (registry, dispatcher) = setup();
        let room = RoomKey::server("s1");
        let (a, mut rx_a) = connect(&dispatcher, 1);
        let (b, mut rx_b) = connect(&dispatcher, 2);
        registry.join(a, &room);
        registry.join(b, &room);

        let delivered = dispatcher.emit_except(&room, a, DomainEvent::typing(&"u1".into()));

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.recv().await.unwrap().name, "typing");
    }

    #[tokio::test]
    async fn test_events_arrive_in_emit_order() {
        let (registry, dispatcher) = setup();
        let room = RoomKey::new("chan-1");
        let (a, mut rx_a) = connect(&dispatcher, 1);
        registry.join(a, &room);

        for id in ["m1", "m2", "m3"] {
            dispatcher.emit(&room, DomainEvent::message_deleted(id));
        }

        for id in ["m1", "m2", "m3"] {
            assert_eq!(rx_a.recv().await.unwrap().payload, json!(id));
        }
    }

    #[tokio::test]
    async fn test_emit_to_single_connection() {
        let (_registry, dispatcher) = setup();
        let (a, mut rx_a) = connect(&dispatcher, 1);

        assert!(dispatcher.emit_to(a, DomainEvent::ready(a)));
        assert!(!dispatcher.emit_to(ConnectionId::new(2), DomainEvent::ready(a)));
        assert_eq!(rx_a.recv().await.unwrap().name, "ready");
    }
}
