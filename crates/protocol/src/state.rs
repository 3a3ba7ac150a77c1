//! The full-state session snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tabletide_domain::{CharacterRecord, RecordId};

/// Complete session state, as carried by `init` and `state` messages.
///
/// The engine's copy is authoritative; any client-local divergence is
/// overwritten by the next snapshot (subject to the client's pending-edit
/// override, which is a client-side concern).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Character records in display order (order carries no authority)
    #[serde(default)]
    pub players: Vec<CharacterRecord>,
    /// Board geometry, opaque to the protocol
    #[serde(default)]
    pub walls: Vec<Value>,
    /// Record ids in turn order
    #[serde(default)]
    pub turn_order: Vec<RecordId>,
    /// Index into `turn_order`
    #[serde(default)]
    pub current_turn: usize,
    /// Append-only log of event descriptions
    #[serde(default)]
    pub event_log: Vec<String>,
}

impl SessionState {
    pub fn find_player(&self, id: &RecordId) -> Option<&CharacterRecord> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn find_player_mut(&mut self, id: &RecordId) -> Option<&mut CharacterRecord> {
        self.players.iter_mut().find(|p| &p.id == id)
    }
}
