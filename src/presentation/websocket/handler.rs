//! WebSocket Connection Handler
//!
//! One task per socket. Outbound events are drained from the connection's
//! queue by a writer task; the read loop parses client frames and hands
//! them to the realtime hub. Teardown always goes through
//! [`RealtimeHub::disconnect`], whatever ended the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use super::messages::{ClientFrame, FrameError};
use super::session::SessionState;
use crate::application::realtime::RealtimeHub;
use crate::domain::{DomainEvent, UserId};
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limits = &state.settings.websocket;

    ws.max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let hub = state.hub.clone();
    let (connection_id, mut rx) = hub.connect();
    let mut session = SessionState::new(connection_id);

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Forward queued events to the socket
    let mut sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&*event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_frame(text.as_str(), &mut session, &hub) {
                            tracing::debug!(
                                connection_id = %connection_id,
                                error = %e,
                                "Rejected client frame"
                            );
                            hub.notify(connection_id, DomainEvent::error(e.to_string()));
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        hub.notify(connection_id, DomainEvent::error("Binary frames are not supported"));
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong are handled automatically by axum
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Writer ended: the socket can no longer be written to
            _ = &mut sender_task => {
                tracing::debug!(connection_id = %connection_id, "Writer task ended");
                break;
            }
        }
    }

    // Cleanup
    hub.disconnect(connection_id);
    sender_task.abort();

    tracing::info!(
        connection_id = %connection_id,
        user_id = ?session.user_id.as_ref().map(UserId::as_str),
        frames = session.frames_received,
        duration_secs = session.opened_at.elapsed().as_secs(),
        "Socket closed"
    );
}

/// Apply one client frame to the hub.
pub(crate) fn handle_frame(
    text: &str,
    session: &mut SessionState,
    hub: &RealtimeHub,
) -> Result<(), FrameError> {
    let frame = ClientFrame::parse(text)?;
    let connection_id = session.connection_id;
    session.record_frame();

    tracing::trace!(connection_id = %connection_id, event = frame.name(), "Client frame");

    match frame {
        ClientFrame::JoinServer(payload) => {
            let user_id = UserId::new(payload.user_id);
            hub.join_server(connection_id, &payload.server_id, &user_id);
            session.identify(user_id);
        }
        ClientFrame::LeaveServer(payload) => {
            hub.leave_server(connection_id, &payload.server_id);
        }
        ClientFrame::JoinChannel(payload) => {
            hub.join_channel(connection_id, &payload.channel_id);
        }
        ClientFrame::LeaveChannel(payload) => {
            hub.leave_channel(connection_id, &payload.channel_id);
        }
        ClientFrame::JoinConversation(payload) => {
            hub.join_conversation(connection_id, &payload.conversation_id);
        }
        ClientFrame::LeaveConversation(payload) => {
            hub.leave_conversation(connection_id, &payload.conversation_id);
        }
        ClientFrame::Typing(payload) => {
            hub.typing_signal(connection_id, &payload.channel_id, &UserId::new(payload.user_id));
        }
    }

    Ok(())
}
