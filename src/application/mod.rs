//! Application Layer
//!
//! Realtime orchestration, the client-side optimistic sender, and data
//! transfer objects for the HTTP surface. This layer sits between the
//! presentation and domain layers.

pub mod client;
pub mod dto;
pub mod realtime;
