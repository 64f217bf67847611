//! WebSocket upgrade handler and message dispatch.
//!
//! Each connection owns at most one [`EditSession`], independent of the
//! REST sessions and of other sockets. The client opens it with
//! `{"type":"open","user":".."}` and then streams `move` messages while the
//! user drags; every move is answered with a fresh allocation snapshot.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt, stream::SplitSink};
use membudget::config::PanelConfig;
use membudget::session::EditSession;
use membudget::settings::SettingsStore;
use tracing::debug;

use crate::api::handle_index;
use crate::message::{ClientMessage, WsMessage};
use crate::snapshot::AllocationSnapshot;

/// Shared state for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub store: Arc<dyn SettingsStore>,
    pub panel: Arc<PanelConfig>,
}

/// GET /ws: WebSocket upgrade handler.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ws_state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ws_state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, ws_state: WsState) {
    let (mut sink, mut stream) = socket.split();
    let mut session: Option<EditSession> = None;

    debug!("WebSocket client connected");

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                let reply = handle_client_message(
                    &text,
                    &mut session,
                    ws_state.store.as_ref(),
                    &ws_state.panel,
                );
                if ws_send(&mut sink, &reply).await.is_err() {
                    break; // Client disconnected.
                }
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping, pong.
        }
    }

    if session.as_ref().is_some_and(EditSession::is_dirty) {
        debug!("WebSocket client disconnected with unsaved changes");
    } else {
        debug!("WebSocket client disconnected");
    }
}

/// Process a JSON message received from a client and build the reply.
fn handle_client_message(
    text: &str,
    session: &mut Option<EditSession>,
    store: &dyn SettingsStore,
    panel: &PanelConfig,
) -> WsMessage {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!("Ignoring malformed WebSocket message: {e}");
            return error(format!("malformed message: {e}"));
        }
    };

    let user = match (&msg, session.as_ref()) {
        (ClientMessage::Open { user }, _) => user.clone(),
        (_, Some(open)) => open.user().to_string(),
        (_, None) => return error("no open session; send {\"type\":\"open\"} first"),
    };

    match msg {
        ClientMessage::Open { .. } | ClientMessage::Reload => {
            match EditSession::open(store, &user, panel) {
                Ok(opened) => allocation(session.insert(opened)),
                Err(e) => error(e.to_string()),
            }
        }
        ClientMessage::Move { handle, value } => {
            let Some(open) = session.as_mut() else {
                return error("no open session");
            };
            let moved = handle_index(handle).and_then(|index| open.move_handle(index, value));
            match moved {
                Ok(_) => allocation(open),
                Err(e) => error(e.to_string()),
            }
        }
        ClientMessage::Save => {
            let Some(open) = session.as_mut() else {
                return error("no open session");
            };
            match open.save(store) {
                Ok(saved) => WsMessage::Saved {
                    user,
                    allocation: saved.allocation,
                    updated_at: saved.updated_at,
                },
                Err(e) => error(e.to_string()),
            }
        }
        ClientMessage::Reset => {
            let Some(open) = session.as_mut() else {
                return error("no open session");
            };
            match open.reset() {
                Ok(()) => allocation(open),
                Err(e) => error(e.to_string()),
            }
        }
    }
}

fn allocation(session: &EditSession) -> WsMessage {
    WsMessage::Allocation {
        data: AllocationSnapshot::from_session(session),
    }
}

fn error(message: impl Into<String>) -> WsMessage {
    WsMessage::Error {
        message: message.into(),
    }
}

/// Serialize a `WsMessage` and send it over the WebSocket sink.
async fn ws_send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
