//! Client Support
//!
//! Client-side counterpart of the realtime core: optimistic sending on top of
//! the message API, reconciled against realtime broadcasts.

pub mod sender;

pub use sender::{ApiError, MessageApi, OptimisticSender, SendError};
