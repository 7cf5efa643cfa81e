//! Realtime core errors.

/// Realtime core errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("Dispatcher requested before the realtime transport was initialized")]
    DispatcherUninitialized,

    #[error("Dispatcher already initialized")]
    AlreadyInitialized,
}
