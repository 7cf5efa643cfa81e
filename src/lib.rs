//! # Chat Realtime Library
//!
//! Realtime messaging and presence core of a chat platform:
//! - WebSocket gateway with room subscriptions (servers, channels, conversations)
//! - Fan-out of domain events to room members
//! - Ephemeral presence (`user-connected` / `user-disconnected`)
//! - Debounced typing indicators
//! - Client-side optimistic send reconciliation
//!
//! ## Architecture
//!
//! - **Domain Layer**: Events, message records, identifiers, reconciliation
//! - **Application Layer**: Realtime hub and its components, client sender, DTOs
//! - **Infrastructure Layer**: Metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! chat_realtime/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, reconciler
//! +-- application/    Realtime hub, optimistic sender, DTOs
//! +-- infrastructure/ Prometheus metrics
//! +-- presentation/   HTTP routes and WebSocket handler
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core types and pure logic
pub mod domain;

// Application layer - Realtime orchestration
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
