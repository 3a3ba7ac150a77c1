//! Connection management for WebSocket clients.
//!
//! Tracks connected participants and fans session snapshots out to them.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use tabletide_domain::ParticipantRole;
use tabletide_protocol::ServerMessage;

use crate::store::SessionStore;

/// Information about a connected participant.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: Uuid,
    /// User identifier; doubles as the owner id for records this
    /// connection creates
    pub user_id: String,
    /// Display name declared via `join`, if any
    pub name: Option<String>,
    /// Client-declared role; gates editing in the client UI only
    pub role: ParticipantRole,
}

impl ConnectionInfo {
    /// Check if this connection declared the game-master role.
    pub fn is_gm(&self) -> bool {
        matches!(self.role, ParticipantRole::Gm)
    }
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: RwLock<HashMap<Uuid, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    pub async fn register(
        &self,
        connection_id: Uuid,
        user_id: String,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let info = ConnectionInfo {
            connection_id,
            user_id,
            name: None,
            role: ParticipantRole::Player,
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Register a connection and seed it with an `init` snapshot.
    ///
    /// The snapshot is taken while holding the connections write lock, so
    /// any concurrent broadcast either lands in the snapshot or is
    /// delivered after registration completes. Either way `init` is the
    /// first frame on the wire and no mutation is missed.
    pub async fn register_seeded(
        &self,
        connection_id: Uuid,
        user_id: String,
        sender: mpsc::Sender<ServerMessage>,
        store: &SessionStore,
    ) {
        let mut connections = self.connections.write().await;
        let init = ServerMessage::Init {
            state: store.snapshot().await,
        };
        if sender.try_send(init).is_err() {
            tracing::warn!(connection_id = %connection_id, "Failed to queue init message");
        }
        let info = ConnectionInfo {
            connection_id,
            user_id,
            name: None,
            role: ParticipantRole::Player,
        };
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection.
    pub async fn unregister(&self, connection_id: Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    /// Get connection info by ID.
    pub async fn get(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|(info, _)| info.clone())
    }

    /// Record the name and role a connection declared via `join`.
    pub async fn join(&self, connection_id: Uuid, name: String, role: ParticipantRole) {
        let mut connections = self.connections.write().await;
        if let Some((info, _)) = connections.get_mut(&connection_id) {
            info.name = Some(name);
            info.role = role;
            tracing::info!(
                connection_id = %connection_id,
                role = ?role,
                "Connection joined session"
            );
        }
    }

    /// Number of live connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Broadcast a message to every connection, including the originator.
    pub async fn broadcast(&self, message: ServerMessage) {
        let connections = self.connections.read().await;
        for (info, sender) in connections.values() {
            if let Err(e) = sender.try_send(message.clone()) {
                tracing::warn!(
                    connection_id = %info.connection_id,
                    error = %e,
                    "Failed to broadcast message"
                );
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletide_protocol::SessionState;

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection() {
        let manager = ConnectionManager::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        manager.register(Uuid::new_v4(), "a".into(), tx_a).await;
        manager.register(Uuid::new_v4(), "b".into(), tx_b).await;

        manager
            .broadcast(ServerMessage::State {
                state: SessionState::default(),
            })
            .await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_register_seeded_queues_init_before_broadcasts() {
        use crate::store::Mutation;
        use tabletide_domain::CharacterRecord;

        let manager = ConnectionManager::new();
        let store = SessionStore::default();
        let _ = store
            .apply(Mutation::AddPlayer(CharacterRecord::new(
                "p1", "Mira", "user-a",
            )))
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        manager
            .register_seeded(Uuid::new_v4(), "a".into(), tx, &store)
            .await;
        manager
            .broadcast(ServerMessage::State {
                state: store.snapshot().await,
            })
            .await;

        let first = rx.try_recv().expect("init queued");
        assert!(matches!(first, ServerMessage::Init { state } if state.players.len() == 1));
        let second = rx.try_recv().expect("broadcast delivered");
        assert!(matches!(second, ServerMessage::State { .. }));
    }

    #[tokio::test]
    async fn test_join_updates_role() {
        let manager = ConnectionManager::new();
        let id = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(8);
        manager.register(id, "a".into(), tx).await;
        manager
            .join(id, "Sam".into(), ParticipantRole::Gm)
            .await;

        let info = manager.get(id).await.expect("connection present");
        assert!(info.is_gm());
        assert_eq!(info.name.as_deref(), Some("Sam"));
    }
}
