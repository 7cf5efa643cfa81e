//! Ephemeral Presence Tracker
//!
//! A connection starts out anonymous and becomes identified when it joins a
//! server room with a user id. Identified connections announce themselves to
//! the server room on join and on disconnect. Presence is best-effort: a
//! process that dies before its disconnect handlers run announces nothing.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use super::dispatcher::Dispatcher;
use crate::domain::{ConnectionId, DomainEvent, RoomKey, UserId};

/// Presence state of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceState {
    /// Connected, no server/user bound yet
    Anonymous,
    /// Bound to one or more server rooms
    Identified { bindings: Vec<PresenceBinding> },
}

/// A (server room, user) pair a connection announced itself in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceBinding {
    pub room: RoomKey,
    pub user_id: UserId,
}

impl PresenceState {
    pub fn is_identified(&self) -> bool {
        matches!(self, Self::Identified { .. })
    }

    fn bindings(&self) -> &[PresenceBinding] {
        match self {
            Self::Anonymous => &[],
            Self::Identified { bindings } => bindings,
        }
    }
}

/// Per-connection presence state machine.
pub struct PresenceTracker {
    dispatcher: Arc<Dispatcher>,
    states: DashMap<ConnectionId, PresenceState>,
}

impl PresenceTracker {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            states: DashMap::new(),
        }
    }

    /// Record a newly opened, anonymous connection.
    pub fn connect(&self, connection: ConnectionId) {
        self.states.insert(connection, PresenceState::Anonymous);
    }

    /// Handle `join-server`: join the server room and announce the user.
    ///
    /// Repeating the same (room, user) pair is a no-op. Returns `true` if a
    /// `user-connected` event was emitted.
    pub fn identify(&self, connection: ConnectionId, room: &RoomKey, user_id: &UserId) -> bool {
        self.dispatcher.registry().join(connection, room);

        let binding = PresenceBinding {
            room: room.clone(),
            user_id: user_id.clone(),
        };

        let is_new = {
            let mut state = self
                .states
                .entry(connection)
                .or_insert(PresenceState::Anonymous);

            match &mut *state {
                PresenceState::Identified { bindings } if bindings.contains(&binding) => false,
                PresenceState::Identified { bindings } => {
                    bindings.push(binding);
                    true
                }
                PresenceState::Anonymous => {
                    *state = PresenceState::Identified {
                        bindings: vec![binding],
                    };
                    true
                }
            }
        };

        if is_new {
            tracing::info!(
                connection_id = %connection,
                room = %room,
                user_id = %user_id,
                "User connected"
            );
            self.dispatcher.emit_except(
                room,
                connection,
                DomainEvent::user_connected(user_id, Utc::now().timestamp_millis()),
            );
        }

        is_new
    }

    /// Handle an explicit `leave-server`: announce and drop one binding.
    ///
    /// Returns `true` if a `user-disconnected` event was emitted.
    pub fn unbind(&self, connection: ConnectionId, room: &RoomKey) -> bool {
        let removed = self.states.get_mut(&connection).and_then(|mut state| {
            let PresenceState::Identified { bindings } = &mut *state else {
                return None;
            };
            let index = bindings.iter().position(|b| &b.room == room)?;
            let binding = bindings.remove(index);
            if bindings.is_empty() {
                *state = PresenceState::Anonymous;
            }
            Some(binding)
        });

        self.dispatcher.registry().leave(connection, room);

        match removed {
            Some(binding) => {
                self.announce_disconnect(connection, &binding);
                true
            }
            None => false,
        }
    }

    /// Handle transport disconnect.
    ///
    /// Emits one `user-disconnected` per bound server room. An anonymous
    /// connection emits nothing. Returns the number of events emitted.
    pub fn disconnect(&self, connection: ConnectionId) -> usize {
        let Some((_, state)) = self.states.remove(&connection) else {
            return 0;
        };

        for binding in state.bindings() {
            self.announce_disconnect(connection, binding);
        }

        state.bindings().len()
    }

    /// Current state of a connection, `None` once disconnected.
    pub fn state_of(&self, connection: ConnectionId) -> Option<PresenceState> {
        self.states.get(&connection).map(|state| state.clone())
    }

    /// Users currently announced in a server room.
    pub fn online_users(&self, room: &RoomKey) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .states
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .bindings()
                    .iter()
                    .filter(|b| &b.room == room)
                    .map(|b| b.user_id.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        users.sort();
        users.dedup();
        users
    }

    fn announce_disconnect(&self, connection: ConnectionId, binding: &PresenceBinding) {
        tracing::info!(
            connection_id = %connection,
            room = %binding.room,
            user_id = %binding.user_id,
            "User disconnected"
        );
        self.dispatcher.emit_except(
            &binding.room,
            connection,
            DomainEvent::user_disconnected(&binding.user_id, Utc::now().timestamp_millis()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::realtime::dispatcher::ConnectionReceiver;
    use crate::application::realtime::registry::RoomRegistry;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn setup() -> (Arc<Dispatcher>, PresenceTracker) {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(RoomRegistry::new())));
        let tracker = PresenceTracker::new(dispatcher.clone());
        (dispatcher, tracker)
    }

    fn connect(
        dispatcher: &Dispatcher,
        tracker: &PresenceTracker,
        id: u64,
    ) -> (ConnectionId, ConnectionReceiver) {
        let connection = ConnectionId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();
        dispatcher.register_connection(connection, tx);
        tracker.connect(connection);
        (connection, rx)
    }

    fn drain_names(rx: &mut ConnectionReceiver) -> Vec<String> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name.clone());
        }
        names
    }

    #[tokio::test]
    async fn test_connect_then_disconnect_announces_once_each_in_order() {
        let (dispatcher, tracker) = setup();
        let room = RoomKey::server("s1");
        let (observer, mut rx) = connect(&dispatcher, &tracker, 1);
        tracker.identify(observer, &room, &UserId::new("watcher"));

        let (conn, _rx_conn) = connect(&dispatcher, &tracker, 2);
        assert!(tracker.identify(conn, &room, &UserId::new("u1")));
        assert_eq!(tracker.disconnect(conn), 1);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "user-connected");
        assert_eq!(events[0].payload["userId"], "u1");
        assert_eq!(events[1].name, "user-disconnected");
        assert_eq!(events[1].payload["userId"], "u1");
    }

    #[tokio::test]
    async fn test_anonymous_disconnect_emits_nothing() {
        let (dispatcher, tracker) = setup();
        let room = RoomKey::server("s1");
        let (observer, mut rx) = connect(&dispatcher, &tracker, 1);
        tracker.identify(observer, &room, &UserId::new("watcher"));

        let (conn, _rx_conn) = connect(&dispatcher, &tracker, 2);
        dispatcher.registry().join(conn, &room);

        assert_eq!(tracker.disconnect(conn), 0);
        assert!(drain_names(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_repeat_identify_is_idempotent() {
        let (dispatcher, tracker) = setup();
        let room = RoomKey::server("s1");
        let (observer, mut rx) = connect(&dispatcher, &tracker, 1);
        tracker.identify(observer, &room, &UserId::new("watcher"));
        let (conn, _rx_conn) = connect(&dispatcher, &tracker, 2);

        assert!(tracker.identify(conn, &room, &UserId::new("u1")));
        assert!(!tracker.identify(conn, &room, &UserId::new("u1")));

        assert_eq!(drain_names(&mut rx), vec!["user-connected"]);
    }

    #[tokio::test]
    async fn test_joiner_does_not_receive_own_announcement() {
        let (dispatcher, tracker) = setup();
        let (conn, mut rx) = connect(&dispatcher, &tracker, 1);

        tracker.identify(conn, &RoomKey::server("s1"), &UserId::new("u1"));

        assert!(drain_names(&mut rx).is_empty());
        assert!(tracker.state_of(conn).unwrap().is_identified());
    }

    #[tokio::test]
    async fn test_disconnect_announces_in_every_bound_server() {
        let (dispatcher, tracker) = setup();
        let s1 = RoomKey::server("s1");
        let s2 = RoomKey::server("s2");
        let (w1, mut rx1) = connect(&dispatcher, &tracker, 1);
        let (w2, mut rx2) = connect(&dispatcher, &tracker, 2);
        tracker.identify(w1, &s1, &UserId::new("w1"));
        tracker.identify(w2, &s2, &UserId::new("w2"));

        let (conn, _rx_conn) = connect(&dispatcher, &tracker, 3);
        tracker.identify(conn, &s1, &UserId::new("u1"));
        tracker.identify(conn, &s2, &UserId::new("u1"));

        assert_eq!(tracker.disconnect(conn), 2);
        assert_eq!(drain_names(&mut rx1), vec!["user-connected", "user-disconnected"]);
        assert_eq!(drain_names(&mut rx2), vec!["user-connected", "user-disconnected"]);
    }

    #[tokio::test]
    async fn test_unbind_announces_and_leaves_room() {
        let (dispatcher, tracker) = setup();
        let room = RoomKey::server("s1");
        let (observer, mut rx) = connect(&dispatcher, &tracker, 1);
        tracker.identify(observer, &room, &UserId::new("watcher"));
        let (conn, _rx_conn) = connect(&dispatcher, &tracker, 2);
        tracker.identify(conn, &room, &UserId::new("u1"));

        assert!(tracker.unbind(conn, &room));

        assert_eq!(drain_names(&mut rx), vec!["user-connected", "user-disconnected"]);
        assert!(!dispatcher.registry().is_member(conn, &room));
        assert_eq!(tracker.state_of(conn), Some(PresenceState::Anonymous));
        assert_eq!(tracker.disconnect(conn), 0);
    }

    #[tokio::test]
    async fn test_online_users() {
        let (dispatcher, tracker) = setup();
        let room = RoomKey::server("s1");
        let (a, _rx_a) = connect(&dispatcher, &tracker, 1);
        let (b, _rx_b) = connect(&dispatcher, &tracker, 2);
        tracker.identify(a, &room, &UserId::new("bob"));
        tracker.identify(b, &room, &UserId::new("alice"));

        assert_eq!(
            tracker.online_users(&room),
            vec![UserId::new("alice"), UserId::new("bob")]
        );
    }
}
