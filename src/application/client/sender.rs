//! Optimistic Sender
//!
//! Client-side driver of the reconciler: shows a message as `sending` the
//! moment it is submitted, persists it through the message API, and folds
//! both the API response and the realtime broadcast into the same timeline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::{DomainEvent, Reconciler, ServerMessage, Timeline, TimelineEvent};

/// Message persistence API as seen by a client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Persist a message. The temporary id is sent along so the server can
    /// echo it in the broadcast.
    async fn create_message(&self, content: String, temp_id: String) -> Result<ServerMessage, ApiError>;
}

/// Message API errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Optimistic sender errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No failed message with temporary id {0}")]
    NotRetryable(String),
}

/// Owns one client view's timeline.
pub struct OptimisticSender<A: MessageApi> {
    api: Arc<A>,
    timeline: Mutex<Timeline>,
}

impl<A: MessageApi> OptimisticSender<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self::with_history(api, Vec::new())
    }

    /// Start from already persisted history.
    pub fn with_history(api: Arc<A>, history: Vec<ServerMessage>) -> Self {
        Self {
            api,
            timeline: Mutex::new(Timeline::from_history(history)),
        }
    }

    /// Current timeline.
    pub fn timeline(&self) -> Timeline {
        self.timeline.lock().clone()
    }

    /// Submit a message. Returns its temporary id.
    ///
    /// The entry is visible as `sending` before the API call starts. On
    /// failure it is already marked `failed` in the timeline when the error
    /// is returned, and can be retried.
    pub async fn send(&self, content: impl Into<String>) -> Result<String, SendError> {
        let content = content.into();
        let temp_id = Uuid::new_v4().to_string();

        self.apply(TimelineEvent::Submitted {
            temp_id: temp_id.clone(),
            content: content.clone(),
            submitted_at: Utc::now(),
        });

        self.persist(content, temp_id).await
    }

    /// Resubmit a failed message.
    pub async fn retry(&self, temp_id: &str) -> Result<String, SendError> {
        let content = self
            .timeline
            .lock()
            .messages()
            .iter()
            .find(|m| m.is_failed() && m.has_temp_id(temp_id))
            .map(|m| m.content.clone())
            .ok_or_else(|| SendError::NotRetryable(temp_id.to_string()))?;

        self.apply(TimelineEvent::Retried {
            temp_id: temp_id.to_string(),
        });

        self.persist(content, temp_id.to_string()).await
    }

    /// Fold a realtime event into the timeline. Events that do not concern
    /// messages are ignored.
    pub fn receive(&self, event: &DomainEvent) -> bool {
        match TimelineEvent::from_domain_event(event) {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    async fn persist(&self, content: String, temp_id: String) -> Result<String, SendError> {
        match self.api.create_message(content, temp_id.clone()).await {
            Ok(message) => {
                self.apply(TimelineEvent::Confirmed(message.with_client_ref(temp_id.clone())));
                Ok(temp_id)
            }
            Err(e) => {
                tracing::warn!(temp_id = %temp_id, error = %e, "Message send failed");
                self.apply(TimelineEvent::SendFailed {
                    temp_id: temp_id.clone(),
                });
                Err(e.into())
            }
        }
    }

    fn apply(&self, event: TimelineEvent) {
        let mut timeline = self.timeline.lock();
        let current = std::mem::take(&mut *timeline);
        *timeline = Reconciler::reconcile(current, event);
    }
}
