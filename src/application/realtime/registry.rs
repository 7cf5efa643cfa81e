//! Room Membership Registry
//!
//! Tracks which connections belong to which rooms. Rooms have no lifecycle of
//! their own: a room exists while at least one connection has joined its key.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::{ConnectionId, RoomKey};
use crate::infrastructure::metrics;

/// Room key to member set, plus the reverse index used on disconnect.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Members of each room
    rooms: DashMap<RoomKey, HashSet<ConnectionId>>,
    /// Rooms joined by each connection
    memberships: DashMap<ConnectionId, HashSet<RoomKey>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room.
    ///
    /// Idempotent. Returns `true` if the connection was not already a member.
    pub fn join(&self, connection: ConnectionId, room: &RoomKey) -> bool {
        let inserted = self
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection);

        self.memberships
            .entry(connection)
            .or_default()
            .insert(room.clone());

        if inserted {
            tracing::debug!(connection_id = %connection, room = %room, "Joined room");
            metrics::set_rooms_active(self.rooms.len());
        }

        inserted
    }

    /// Remove a connection from a room.
    ///
    /// Returns `true` if the connection was a member.
    pub fn leave(&self, connection: ConnectionId, room: &RoomKey) -> bool {
        let removed = self.remove_member(connection, room);

        if let Some(mut rooms) = self.memberships.get_mut(&connection) {
            rooms.remove(room);
        }
        self.memberships.remove_if(&connection, |_, rooms| rooms.is_empty());

        if removed {
            tracing::debug!(connection_id = %connection, room = %room, "Left room");
        }

        removed
    }

    /// Remove a connection from every room it joined.
    ///
    /// Returns the rooms that were left.
    pub fn leave_all(&self, connection: ConnectionId) -> Vec<RoomKey> {
        let rooms: Vec<RoomKey> = self
            .memberships
            .remove(&connection)
            .map(|(_, rooms)| rooms.into_iter().collect())
            .unwrap_or_default();

        for room in &rooms {
            self.remove_member(connection, room);
        }

        if !rooms.is_empty() {
            tracing::debug!(
                connection_id = %connection,
                rooms = rooms.len(),
                "Left all rooms"
            );
        }

        rooms
    }

    /// Snapshot of a room's members. Empty if the room was never joined.
    pub fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the rooms a connection has joined.
    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomKey> {
        self.memberships
            .get(&connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, connection: ConnectionId, room: &RoomKey) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains(&connection))
            .unwrap_or(false)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_member(&self, connection: ConnectionId, room: &RoomKey) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => members.remove(&connection),
            None => false,
        };

        // Drop the room once its last member is gone
        if self.rooms.remove_if(room, |_, members| members.is_empty()).is_some() {
            metrics::set_rooms_active(self.rooms.len());
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_join_adds_member() {
        let registry = RoomRegistry::new();
        let room = RoomKey::new("chan-1");

        assert!(registry.join(conn(1), &room));
        assert_eq!(registry.members_of(&room), vec![conn(1)]);
        assert!(registry.is_member(conn(1), &room));
    }

    #[test]
    fn test_join_is_idempotent() {
        let registry = RoomRegistry::new();
        let room = RoomKey::new("chan-1");

        assert!(registry.join(conn(1), &room));
        assert!(!registry.join(conn(1), &room));

        assert_eq!(registry.members_of(&room), vec![conn(1)]);
        assert_eq!(registry.rooms_of(conn(1)), vec![room]);
    }

    #[test]
    fn test_leave_removes_member() {
        let registry = RoomRegistry::new();
        let room = RoomKey::new("chan-1");
        registry.join(conn(1), &room);
        registry.join(conn(2), &room);

        assert!(registry.leave(conn(1), &room));

        assert_eq!(registry.members_of(&room), vec![conn(2)]);
        assert!(registry.rooms_of(conn(1)).is_empty());
    }

    #[test]
    fn test_leave_unknown_membership_is_noop() {
        let registry = RoomRegistry::new();
        assert!(!registry.leave(conn(1), &RoomKey::new("nowhere")));
    }

    #[test]
    fn test_members_of_unknown_room_is_empty() {
        let registry = RoomRegistry::new();
        assert!(registry.members_of(&RoomKey::new("never-joined")).is_empty());
    }

    #[test]
    fn test_leave_all_removes_every_membership() {
        let registry = RoomRegistry::new();
        let server = RoomKey::server("s1");
        let channel = RoomKey::channel("c1");
        registry.join(conn(1), &server);
        registry.join(conn(1), &channel);
        registry.join(conn(2), &channel);

        let mut left = registry.leave_all(conn(1));
        left.sort();

        assert_eq!(left, vec![channel.clone(), server.clone()]);
        assert!(registry.members_of(&server).is_empty());
        assert_eq!(registry.members_of(&channel), vec![conn(2)]);
        assert!(registry.rooms_of(conn(1)).is_empty());
    }

    #[test]
    fn test_empty_rooms_are_dropped() {
        let registry = RoomRegistry::new();
        let room = RoomKey::new("chan-1");
        registry.join(conn(1), &room);
        assert_eq!(registry.room_count(), 1);

        registry.leave(conn(1), &room);
        assert_eq!(registry.room_count(), 0);
    }
}
