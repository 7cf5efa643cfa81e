//! HTTP Surface
//!
//! Health probes, metrics, and the collaborator API for emitting events.

pub mod extractors;
pub mod handlers;
pub mod routes;
