//! WebSocket message types for Engine-Player communication
//!
//! Every frame is a JSON object with a `type` discriminator. Client intents
//! that mutate the session trigger a full-state broadcast to every
//! connection; intents with an unknown `type` are accepted and ignored so
//! newer clients can talk to older engines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tabletide_domain::{CharacterRecord, ParticipantRole, RecordId, SheetContainer};

use crate::state::SessionState;

// =============================================================================
// Client Messages (Player → Engine)
// =============================================================================

/// Messages from client (Player) to server (Engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Declare a participant name and role for this connection
    Join {
        name: String,
        #[serde(default)]
        role: ParticipantRole,
    },
    /// Append a character record
    AddPlayer { player: CharacterRecord },
    /// Move a record on the board
    MovePlayer { id: RecordId, x: f64, y: f64 },
    /// Replace a record's entire sheet (whole sheet, not a diff)
    SetPlayerSheet { id: RecordId, sheet: SheetContainer },
    /// Remove a record
    RemovePlayer { id: RecordId },
    /// Replace the board geometry
    SetWalls { walls: Vec<Value> },
    /// Replace the turn order
    SetTurnOrder { order: Vec<RecordId> },
    /// Advance to the next turn, wrapping at the end
    AdvanceTurn,
    /// Append a line to the session event log
    LogEvent { text: String },
    /// Forward compatibility: unrecognized types are ignored, not errors
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (Engine → Player)
// =============================================================================

/// Messages from server (Engine) to client (Player)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once per new connection, seeding the client's local state
    Init { state: SessionState },
    /// Sent after every accepted mutation, to all connections
    State { state: SessionState },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_wire_names() {
        let msg = ClientMessage::MovePlayer {
            id: RecordId::new("r1"),
            x: 3.0,
            y: 4.0,
        };
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire, json!({"type": "movePlayer", "id": "r1", "x": 3.0, "y": 4.0}));

        let back: ClientMessage = serde_json::from_value(wire).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_unknown_type_is_accepted() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "rollInitiative", "sides": 20}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown);
    }

    #[test]
    fn test_join_defaults_role_to_player() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "join", "name": "Sam"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                name: "Sam".to_string(),
                role: ParticipantRole::Player,
            }
        );
    }

    #[test]
    fn test_server_message_wire_names() {
        let msg = ServerMessage::Init {
            state: SessionState::default(),
        };
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["type"], "init");
        assert_eq!(wire["state"]["players"], json!([]));
    }
}
