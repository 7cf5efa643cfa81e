//! Event Handlers
//!
//! Lets out-of-process persistence services push domain events to rooms
//! after a successful write.
//!
//! There is no authentication here and any event name is accepted for any
//! room, so the route must only be reachable from the internal CRUD layer.

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::{EmitEventRequest, EmitEventResponse};
use crate::domain::{DomainEvent, RoomKey};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Emit an event to a room
///
/// POST /api/v1/events
pub async fn emit_event(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmitEventRequest>,
) -> Result<(StatusCode, Json<EmitEventResponse>), AppError> {
    let dispatcher = state.hub.dispatcher()?;

    let room = RoomKey::new(request.room);
    let delivered = dispatcher.emit(&room, DomainEvent::new(request.event, request.payload));

    Ok((StatusCode::ACCEPTED, Json(EmitEventResponse { delivered })))
}
