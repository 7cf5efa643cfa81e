//! Typing Indicator Debouncer
//!
//! Keeps one expiry timer per (room, user). Every typing signal replaces the
//! timer; when a timer runs out without being replaced, `stop-typing` is
//! emitted to the room. There is no explicit stop signal from clients, so a
//! user who keeps typing keeps the indicator alive indefinitely.
//!
//! Timers are tokio tasks. Replacement aborts the old task, and each timer
//! carries a generation number that is re-checked under the map entry lock
//! before emitting, so a timer that lost a race with its replacement never
//! emits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::dispatcher::Dispatcher;
use crate::domain::{ConnectionId, DomainEvent, RoomKey, UserId};
use crate::infrastructure::metrics;

/// Default typing window in milliseconds.
pub const DEFAULT_TYPING_TIMEOUT_MS: u64 = 3000;

/// Key of one typing indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypingKey {
    pub room: RoomKey,
    pub user_id: UserId,
}

impl TypingKey {
    pub fn new(room: &RoomKey, user_id: &UserId) -> Self {
        Self {
            room: room.clone(),
            user_id: user_id.clone(),
        }
    }
}

/// Handle of a pending expiry.
#[derive(Debug)]
pub struct TypingTimer {
    handle: JoinHandle<()>,
    generation: u64,
    /// Connection that sent the typing signal, if known
    owner: Option<ConnectionId>,
}

impl TypingTimer {
    /// Stop the timer. A cancelled timer never emits.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Per (room, user) typing timers.
pub struct TypingDebouncer {
    dispatcher: Arc<Dispatcher>,
    window: Duration,
    timers: Arc<DashMap<TypingKey, TypingTimer>>,
    generation: AtomicU64,
}

impl TypingDebouncer {
    pub fn new(dispatcher: Arc<Dispatcher>, window: Duration) -> Self {
        Self {
            dispatcher,
            window,
            timers: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Start or restart the typing window for `user_id` in `room`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mark_typing(&self, room: &RoomKey, user_id: &UserId) {
        self.start_timer(TypingKey::new(room, user_id), None);
    }

    /// Same as [`mark_typing`](Self::mark_typing), remembering the
    /// connection the signal came from so its timers can be cancelled on
    /// teardown.
    pub fn mark_typing_from(&self, connection: ConnectionId, room: &RoomKey, user_id: &UserId) {
        self.start_timer(TypingKey::new(room, user_id), Some(connection));
    }

    /// Cancel a pending timer without emitting.
    pub fn cancel(&self, room: &RoomKey, user_id: &UserId) -> bool {
        let removed = self.timers.remove(&TypingKey::new(room, user_id));
        if let Some((_, timer)) = &removed {
            timer.cancel();
        }
        metrics::set_typing_timers(self.timers.len());
        removed.is_some()
    }

    /// Cancel every timer started by a connection. Called on teardown.
    pub fn cancel_connection(&self, connection: ConnectionId) -> usize {
        self.cancel_where(connection, |_| true)
    }

    /// Cancel the timers a connection started in one room. Called when it
    /// leaves the room.
    pub fn cancel_connection_in(&self, connection: ConnectionId, room: &RoomKey) -> usize {
        self.cancel_where(connection, |key| &key.room == room)
    }

    fn cancel_where(&self, connection: ConnectionId, matches: impl Fn(&TypingKey) -> bool) -> usize {
        let mut cancelled = 0;
        self.timers.retain(|key, timer| {
            if timer.owner == Some(connection) && matches(key) {
                timer.cancel();
                cancelled += 1;
                false
            } else {
                true
            }
        });

        if cancelled > 0 {
            tracing::debug!(
                connection_id = %connection,
                cancelled = cancelled,
                "Typing timers cancelled"
            );
        }
        metrics::set_typing_timers(self.timers.len());

        cancelled
    }

    pub fn is_typing(&self, room: &RoomKey, user_id: &UserId) -> bool {
        self.timers.contains_key(&TypingKey::new(room, user_id))
    }

    /// Number of live timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    fn start_timer(&self, key: TypingKey, owner: Option<ConnectionId>) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        // The entry lock is held across cancel + spawn + insert so an
        // expiring timer cannot observe a half-replaced entry.
        match self.timers.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get().cancel();
                let handle = self.spawn_expiry(key, generation);
                entry.insert(TypingTimer {
                    handle,
                    generation,
                    owner,
                });
            }
            Entry::Vacant(entry) => {
                let handle = self.spawn_expiry(key, generation);
                entry.insert(TypingTimer {
                    handle,
                    generation,
                    owner,
                });
            }
        }

        metrics::set_typing_timers(self.timers.len());
    }

    fn spawn_expiry(&self, key: TypingKey, generation: u64) -> JoinHandle<()> {
        let timers = Arc::clone(&self.timers);
        let dispatcher = Arc::clone(&self.dispatcher);
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let expired = timers
                .remove_if(&key, |_, timer| timer.generation == generation)
                .is_some();
            metrics::set_typing_timers(timers.len());

            if expired {
                tracing::debug!(room = %key.room, user_id = %key.user_id, "Typing expired");
                dispatcher.emit(&key.room, DomainEvent::stop_typing(&key.user_id));
            }
        })
    }
}
