//! Middleware
//!
//! Tower middleware for request processing.

pub mod cors;
pub mod logging;

pub use logging::track_http_metrics;
