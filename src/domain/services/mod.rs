//! # Domain Services
//!
//! Domain services encapsulate logic that doesn't naturally belong to a
//! single entity.
//!
//! ## Services
//!
//! - **Reconciler**: merges optimistic client sends with server broadcasts

mod reconciler;

pub use reconciler::*;
