//! Realtime Core
//!
//! Server-side realtime state: which connections are in which rooms, who is
//! online, who is typing, and delivery of domain events to room members.
//!
//! ## Components
//!
//! - **RoomRegistry**: room membership of connections
//! - **Dispatcher**: fan-out of events to room members
//! - **PresenceTracker**: `user-connected` / `user-disconnected` lifecycle
//! - **TypingDebouncer**: per-user typing windows and `stop-typing`
//! - **RealtimeHub**: owns all of the above for one process

pub mod dispatcher;
pub mod error;
pub mod hub;
pub mod presence;
pub mod registry;
pub mod typing;

pub use dispatcher::{ConnectionReceiver, ConnectionSender, Dispatcher, OutboundEvent};
pub use error::RealtimeError;
pub use hub::{DispatcherHandle, RealtimeHub};
pub use presence::{PresenceBinding, PresenceState, PresenceTracker};
pub use registry::RoomRegistry;
pub use typing::{TypingDebouncer, TypingKey, TypingTimer, DEFAULT_TYPING_TIMEOUT_MS};
