//! Debounced edit delivery.
//!
//! Sheet edits are keystroke-granular, so sending one `setPlayerSheet` per
//! keystroke would flood the engine and trigger a broadcast storm. The
//! buffer coalesces edits per record: every edit re-arms a timer, and only
//! the timer matching the record's latest generation sends the sheet.
//!
//! All state lives behind a single event loop fed by an mpsc channel, so
//! edits, timer fires and server snapshots are serialized without extra
//! locking on the hot path.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use tabletide_domain::RecordId;
use tabletide_protocol::{ClientMessage, ServerMessage};

use crate::client::ClientError;
use crate::session::ClientSession;

/// How long a record's sheet must sit unedited before it is sent.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(450);

/// Buffer size for the session command channel.
const COMMAND_CHANNEL_BUFFER: usize = 256;

/// Transport seam for messages leaving the session loop.
#[async_trait::async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, message: ClientMessage) -> Result<(), ClientError>;
}

/// Commands consumed by the session event loop.
#[derive(Debug)]
enum SessionCommand {
    Edit {
        id: RecordId,
        path: String,
        value: Value,
    },
    FlushTimer {
        id: RecordId,
        generation: u64,
    },
    Server(ServerMessage),
}

/// Handle to a running session loop.
///
/// Cloneable and cheap; the loop shuts down when every handle is dropped.
#[derive(Clone)]
pub struct EditBuffer {
    session: Arc<RwLock<ClientSession>>,
    tx: mpsc::Sender<SessionCommand>,
}

impl EditBuffer {
    /// Spawn the session loop with the default quiet period.
    pub fn spawn(outbound: Arc<dyn Outbound>) -> Self {
        Self::spawn_with_debounce(outbound, EDIT_DEBOUNCE)
    }

    /// Spawn the session loop with a caller-chosen quiet period.
    pub fn spawn_with_debounce(outbound: Arc<dyn Outbound>, debounce: Duration) -> Self {
        let session = Arc::new(RwLock::new(ClientSession::new()));
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);

        // The loop and its timers only hold a weak sender: once every
        // handle is dropped the channel closes and the loop exits.
        let loop_session = Arc::clone(&session);
        let loop_tx = tx.downgrade();
        tokio::spawn(async move {
            run_session_loop(loop_session, rx, loop_tx, outbound, debounce).await;
        });

        Self { session, tx }
    }

    /// The mirrored session state, for UI reads.
    pub fn session(&self) -> Arc<RwLock<ClientSession>> {
        Arc::clone(&self.session)
    }

    /// Queue a field edit for a record's sheet.
    pub async fn edit(&self, id: RecordId, path: impl Into<String>, value: Value) {
        let cmd = SessionCommand::Edit {
            id,
            path: path.into(),
            value,
        };
        if self.tx.send(cmd).await.is_err() {
            tracing::warn!("Session loop gone, edit dropped");
        }
    }

    /// Feed a message received from the engine into the loop.
    pub async fn handle_server(&self, message: ServerMessage) {
        if self.tx.send(SessionCommand::Server(message)).await.is_err() {
            tracing::warn!("Session loop gone, server message dropped");
        }
    }
}

async fn run_session_loop(
    session: Arc<RwLock<ClientSession>>,
    mut rx: mpsc::Receiver<SessionCommand>,
    tx: mpsc::WeakSender<SessionCommand>,
    outbound: Arc<dyn Outbound>,
    debounce: Duration,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Edit { id, path, value } => {
                let generation = session.write().await.edit_field(&id, &path, value);
                let Some(generation) = generation else {
                    tracing::debug!(record_id = %id, "Edit for unknown record ignored");
                    continue;
                };
                // Re-arming is implicit: a newer edit bumps the generation,
                // and this timer's flush becomes a no-op.
                let timer_tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(debounce).await;
                    // A dead upgrade means the session is gone; nothing to
                    // flush anymore.
                    if let Some(timer_tx) = timer_tx.upgrade() {
                        let _ = timer_tx
                            .send(SessionCommand::FlushTimer { id, generation })
                            .await;
                    }
                });
            }
            SessionCommand::FlushTimer { id, generation } => {
                let flushed = session.write().await.flush(&id, generation);
                if let Some(sheet) = flushed {
                    let msg = ClientMessage::SetPlayerSheet {
                        id: id.clone(),
                        sheet,
                    };
                    if let Err(e) = outbound.send(msg).await {
                        tracing::warn!(record_id = %id, error = %e, "Failed to send sheet");
                    }
                }
            }
            SessionCommand::Server(message) => match message {
                ServerMessage::Init { state } | ServerMessage::State { state } => {
                    session.write().await.apply_snapshot(state);
                }
            },
        }
    }
}
