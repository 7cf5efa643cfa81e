//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **ConnectionId**: opaque handle for a live transport session
//! - **UserId**: user identifier issued by the authentication layer
//! - **RoomKey**: namespaced key of a broadcast room

mod identifiers;
mod room_key;

pub use identifiers::*;
pub use room_key::*;
