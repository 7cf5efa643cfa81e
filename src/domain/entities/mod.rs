//! # Domain Entities
//!
//! Transient objects that flow through the realtime core. Nothing here is
//! persisted by this crate; the persistence layer owns the documents these
//! are built from.
//!
//! - **DomainEvent**: named payload fanned out to a room
//! - **ServerMessage**: a message as confirmed and broadcast by the server
//! - **ClientMessage**: a message in a client's timeline, possibly optimistic

mod client_message;
mod event;
mod message;

pub use client_message::{ClientMessage, DeliveryStatus};
pub use event::{names as event_names, DomainEvent};
pub use message::ServerMessage;
