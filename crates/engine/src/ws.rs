//! WebSocket handling for Player connections.
//!
//! Wires the connection manager and session store together: every new
//! connection is seeded with an `init` snapshot, every accepted mutation
//! triggers a `state` broadcast to all connections. Malformed frames are
//! dropped without closing the connection.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use tabletide_protocol::{ClientMessage, ServerMessage};

use crate::connections::ConnectionManager;
use crate::store::{Mutation, SessionStore};

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub store: Arc<SessionStore>,
    pub connections: Arc<ConnectionManager>,
}

/// Build the engine router: the WebSocket endpoint plus a health probe.
pub fn router(state: Arc<WsState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ws", get(ws_handler).with_state(state))
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = Uuid::new_v4();
    let user_id = connection_id.to_string(); // Anonymous until `join`

    // Bounded channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    // Registration queues the `init` snapshot before the connection is
    // visible to broadcasts, so `init` is always the first frame.
    state
        .connections
        .register_seeded(connection_id, user_id, tx, &state.store)
        .await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_message(msg, &state, connection_id).await,
                Err(e) => {
                    // Dropped silently: the sender gets no error response
                    // and the connection stays up.
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Dropping unparseable message"
                    );
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up
    state.connections.unregister(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message.
async fn handle_message(msg: ClientMessage, state: &WsState, connection_id: Uuid) {
    match msg {
        ClientMessage::Join { name, role } => {
            state.connections.join(connection_id, name, role).await;
        }
        ClientMessage::Unknown => {
            tracing::debug!(connection_id = %connection_id, "Ignoring unknown message type");
        }
        other => {
            let Some(mutation) = Mutation::from_message(other) else {
                return;
            };
            if let Some(snapshot) = state.store.apply(mutation).await {
                state
                    .connections
                    .broadcast(ServerMessage::State { state: snapshot })
                    .await;
            }
        }
    }
}
