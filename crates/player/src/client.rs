//! WebSocket client for communicating with the Engine.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use tabletide_protocol::{ClientMessage, ServerMessage};

use crate::edit_buffer::Outbound;

/// Buffer size for inbound/outbound message channels.
const CHANNEL_BUFFER: usize = 64;

/// Errors from the client transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid engine url: {0}")]
    Url(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Closed,
}

/// Connection to a running Engine.
///
/// `connect` owns the socket through two spawned tasks: a writer draining
/// the outbound channel and a reader pushing parsed server messages into
/// the returned receiver. Frames that fail to parse are logged and
/// dropped, mirroring the engine's own tolerance for malformed input.
pub struct EngineClient {
    tx: mpsc::Sender<ClientMessage>,
}

impl EngineClient {
    /// Connect to the engine's `/ws` endpoint.
    ///
    /// Returns the client handle plus the stream of server messages. The
    /// receiver ends when the connection closes.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerMessage>), ClientError> {
        let url = url::Url::parse(url)?;
        let (ws_stream, _resp) = connect_async(url.as_str()).await?;
        tracing::info!(url = %url, "Connected to engine");

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(CHANNEL_BUFFER);
        let (in_tx, in_rx) = mpsc::channel::<ServerMessage>(CHANNEL_BUFFER);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let Ok(json) = serde_json::to_string(&msg) else {
                    continue;
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::error!(error = %e, "Failed to send message, closing writer");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                if in_tx.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Dropping unparseable server frame");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Engine closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "WebSocket read error");
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok((Self { tx: out_tx }, in_rx))
    }

    /// Queue a message for the engine.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.tx.send(message).await.map_err(|_| ClientError::Closed)
    }
}

#[async_trait::async_trait]
impl Outbound for EngineClient {
    async fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        EngineClient::send(self, message).await
    }
}
