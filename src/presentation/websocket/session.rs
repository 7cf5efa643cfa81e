//! WebSocket Session State

use std::time::Instant;

use crate::domain::{ConnectionId, UserId};

/// Per-socket bookkeeping kept by the connection task
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    /// Last user id the client identified as, if any
    pub user_id: Option<UserId>,
    pub frames_received: u64,
    pub opened_at: Instant,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            user_id: None,
            frames_received: 0,
            opened_at: Instant::now(),
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_received += 1;
    }

    pub fn identify(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
    }
}
