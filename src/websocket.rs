//! `NOTIFICATIONS` WebSocket channel (C12/C13): forwards every [`JervisEvent`]
//! out as one JSON frame per event, and resolves outstanding dialogs (C13)
//! from inbound `USER_DIALOG_RESPONSE`/`USER_DIALOG_CLOSE` frames.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use jervis_core::ids::DialogId;

use crate::state::AppState;

/// Mount the `NOTIFICATIONS` channel at `/ws`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(notifications_handler))
}

/// Connection-established frame sent right after upgrade, so clients can
/// correlate their own logs with the server's.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Greeting {
    Connected { session_id: Uuid },
}

/// Inbound frames the `NOTIFICATIONS` channel accepts.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum InboundFrame {
    UserDialogResponse {
        dialog_id: DialogId,
        #[serde(default)]
        correlation_id: String,
        answer: String,
        accepted: bool,
    },
    UserDialogClose {
        dialog_id: DialogId,
    },
}

/// Upgrade a connection onto the `NOTIFICATIONS` channel.
pub async fn notifications_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(%session_id, "notifications socket connected");

    let (mut sender, mut receiver) = socket.split();

    let greeting = Greeting::Connected { session_id };
    if let Ok(json) = serde_json::to_string(&greeting) {
        let _ = sender.send(Message::Text(json)).await;
    }

    let mut events = state.event_bus.subscribe();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&text, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(%session_id, "notifications socket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Err(err)) => {
                        warn!(%session_id, %err, "notifications socket error");
                        break;
                    }
                    _ => {}
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(%session_id, skipped, "notifications subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn handle_inbound(text: &str, state: &AppState) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(%err, "ignoring malformed notifications frame");
            return;
        }
    };

    match frame {
        InboundFrame::UserDialogResponse { dialog_id, answer, accepted, .. } => {
            state.dialog.respond(dialog_id, answer, accepted).await;
        }
        InboundFrame::UserDialogClose { dialog_id } => {
            state.dialog.close(dialog_id).await;
        }
    }
}
