//! Infrastructure Layer
//!
//! Contains implementations for external concerns:
//! - Prometheus metrics registry and helpers

pub mod metrics;
