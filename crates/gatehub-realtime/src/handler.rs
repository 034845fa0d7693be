//! WebSocket connection handling.
//!
//! Each dashboard connection gets a uuid, an entry in the [`ClientHub`], and
//! two halves: a spawned sender task forwarding hub-channel messages to the
//! socket sink, and an inbound loop on the current task dispatching client
//! messages. Replies travel through the same hub channel as broadcasts, so
//! one writer owns the sink and frames never interleave.

use crate::commands::dispatch_message;
use crate::hub::ClientHub;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use gatehub_registry::AccessEvaluator;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Shared state for the WebSocket endpoint.
#[derive(Clone)]
pub struct HubState {
    pub hub: Arc<ClientHub>,
    pub evaluator: AccessEvaluator,
}

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<HubState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: HubState) {
    let client_id = Uuid::new_v4();
    info!(client_id = %client_id, "Dashboard client connected");

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.hub.register(client_id, tx.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: the only writer to the socket sink.
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = dispatch_message(&state, client_id, text.as_str()).await;
                if tx.send(Message::Text(reply.to_string().into())).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            // Binary payloads and ws-level ping/pong carry no commands.
            Ok(_) => {}
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.hub.remove(client_id).await;
    send_task.abort();
    info!(client_id = %client_id, "Dashboard client disconnected");
}
