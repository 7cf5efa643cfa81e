//! Realtime Hub
//!
//! Owns all realtime state for one server process and wires the components
//! together: every connection-level signal (connect, join, typing,
//! disconnect) goes through here. Handlers receive the hub by `Arc`; there
//! are no module-level registries.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio::sync::mpsc;

use super::dispatcher::{ConnectionReceiver, Dispatcher};
use super::error::RealtimeError;
use super::presence::PresenceTracker;
use super::registry::RoomRegistry;
use super::typing::TypingDebouncer;
use crate::config::RealtimeSettings;
use crate::domain::{ConnectionId, ConnectionIdGenerator, DomainEvent, RoomKey, UserId};

/// Accessor through which the persistence layer reaches the dispatcher.
///
/// It can be handed out before the transport is up; requesting the
/// dispatcher before [`initialize`](Self::initialize) fails fast.
#[derive(Debug, Default)]
pub struct DispatcherHandle {
    inner: OnceCell<Arc<Dispatcher>>,
}

impl DispatcherHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the dispatcher. Can only be done once.
    pub fn initialize(&self, dispatcher: Arc<Dispatcher>) -> Result<(), RealtimeError> {
        self.inner
            .set(dispatcher)
            .map_err(|_| RealtimeError::AlreadyInitialized)
    }

    /// Get the dispatcher.
    pub fn get(&self) -> Result<Arc<Dispatcher>, RealtimeError> {
        self.inner
            .get()
            .cloned()
            .ok_or(RealtimeError::DispatcherUninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Realtime state of the server process.
pub struct RealtimeHub {
    ids: ConnectionIdGenerator,
    registry: Arc<RoomRegistry>,
    dispatcher: Arc<Dispatcher>,
    /// Dispatcher as exposed to collaborators, set once the transport is up
    published: DispatcherHandle,
    presence: PresenceTracker,
    typing: TypingDebouncer,
}

impl RealtimeHub {
    pub fn new(settings: &RealtimeSettings) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(registry.clone()));
        let presence = PresenceTracker::new(dispatcher.clone());
        let typing = TypingDebouncer::new(
            dispatcher.clone(),
            Duration::from_millis(settings.typing_timeout_ms),
        );

        Self {
            ids: ConnectionIdGenerator::new(),
            registry,
            dispatcher,
            published: DispatcherHandle::new(),
            presence,
            typing,
        }
    }

    /// Mark the transport as up and expose the dispatcher to collaborators.
    pub fn initialize(&self) -> Result<(), RealtimeError> {
        self.published.initialize(self.dispatcher.clone())?;
        tracing::info!("Realtime dispatcher initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.published.is_initialized()
    }

    /// Dispatcher for collaborators that emit domain events.
    ///
    /// Fails with [`RealtimeError::DispatcherUninitialized`] until
    /// [`initialize`](Self::initialize) has run.
    pub fn dispatcher(&self) -> Result<Arc<Dispatcher>, RealtimeError> {
        self.published.get()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn typing(&self) -> &TypingDebouncer {
        &self.typing
    }

    /// Open a connection: allocate a handle and its outbound queue.
    pub fn connect(&self) -> (ConnectionId, ConnectionReceiver) {
        let connection = self.ids.next_id();
        let (tx, rx) = mpsc::unbounded_channel();

        self.dispatcher.register_connection(connection, tx);
        self.presence.connect(connection);
        self.dispatcher
            .emit_to(connection, DomainEvent::ready(connection));

        tracing::info!(connection_id = %connection, "Connection opened");

        (connection, rx)
    }

    /// `join-server(serverId, userId)`
    pub fn join_server(&self, connection: ConnectionId, server_id: &str, user_id: &UserId) -> bool {
        self.presence
            .identify(connection, &RoomKey::server(server_id), user_id)
    }

    /// `leave-server(serverId)`
    pub fn leave_server(&self, connection: ConnectionId, server_id: &str) -> bool {
        let room = RoomKey::server(server_id);
        self.typing.cancel_connection_in(connection, &room);
        self.presence.unbind(connection, &room)
    }

    /// `join-channel(channelId)`
    pub fn join_channel(&self, connection: ConnectionId, channel_id: &str) -> bool {
        self.registry.join(connection, &RoomKey::channel(channel_id))
    }

    /// `leave-channel(channelId)`
    pub fn leave_channel(&self, connection: ConnectionId, channel_id: &str) -> bool {
        let room = RoomKey::channel(channel_id);
        self.typing.cancel_connection_in(connection, &room);
        self.registry.leave(connection, &room)
    }

    /// `join-conversation(conversationId)`
    pub fn join_conversation(&self, connection: ConnectionId, conversation_id: &str) -> bool {
        self.registry
            .join(connection, &RoomKey::conversation(conversation_id))
    }

    /// `leave-conversation(conversationId)`
    pub fn leave_conversation(&self, connection: ConnectionId, conversation_id: &str) -> bool {
        self.registry
            .leave(connection, &RoomKey::conversation(conversation_id))
    }

    /// `typing(channelId, userId)`: relay to the other channel members and
    /// restart the user's typing window.
    pub fn typing_signal(&self, connection: ConnectionId, channel_id: &str, user_id: &UserId) {
        let room = RoomKey::channel(channel_id);

        self.dispatcher
            .emit_except(&room, connection, DomainEvent::typing(user_id));
        self.typing.mark_typing_from(connection, &room, user_id);
    }

    /// Send an event to a single connection (`ready`, `error`).
    pub fn notify(&self, connection: ConnectionId, event: DomainEvent) -> bool {
        self.dispatcher.emit_to(connection, event)
    }

    /// Tear down a connection.
    ///
    /// Cancels its typing timers, announces presence departures, then drops
    /// its memberships and outbound queue.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.typing.cancel_connection(connection);
        self.presence.disconnect(connection);
        self.registry.leave_all(connection);
        self.dispatcher.unregister_connection(connection);

        tracing::info!(connection_id = %connection, "Connection closed");
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.dispatcher.connection_count()
    }
}
