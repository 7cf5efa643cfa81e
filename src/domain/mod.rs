//! # Domain Layer
//!
//! Core types of the realtime messaging core. Independent of the transport
//! and of the runtime.
//!
//! ## Structure
//!
//! - **entities**: Domain events and message records
//! - **value_objects**: Connection handles, user ids, room keys
//! - **services**: Pure domain logic (optimistic send reconciliation)

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
