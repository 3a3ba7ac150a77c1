//! The authoritative session store.
//!
//! Holds the canonical `SessionState` and applies mutation intents. All
//! access goes through [`SessionStore::apply`]; nothing else mutates the
//! state, so the store can later be swapped for a persisted one without
//! touching callers. Mutations from different connections are serialized
//! by the write lock; handlers never block inside it.

use std::str::FromStr;

use serde_json::Value;
use tokio::sync::RwLock;

use tabletide_domain::{CharacterRecord, RecordId, SheetContainer};
use tabletide_protocol::{ClientMessage, SessionState};

/// What `addPlayer` does when the incoming id already exists.
///
/// The observed behavior appends without checking, so `Append` is the
/// default; `Replace` and `Reject` are available for deployments that
/// want the gap closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateIdPolicy {
    /// Append the record even if the id already exists
    #[default]
    Append,
    /// Replace the existing record in place, keeping display order
    Replace,
    /// Ignore the intent entirely (no state change, no broadcast)
    Reject,
}

impl FromStr for DuplicateIdPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown duplicate-id policy: {0} (expected append, replace or reject)")]
pub struct UnknownPolicy(String);

/// A validated mutation intent against the session state.
#[derive(Debug, Clone)]
pub enum Mutation {
    AddPlayer(CharacterRecord),
    MovePlayer { id: RecordId, x: f64, y: f64 },
    SetPlayerSheet { id: RecordId, sheet: SheetContainer },
    RemovePlayer { id: RecordId },
    SetWalls(Vec<Value>),
    SetTurnOrder(Vec<RecordId>),
    AdvanceTurn,
    LogEvent(String),
}

impl Mutation {
    /// Map a wire message onto a mutation. Non-mutating messages (join,
    /// unknown types) map to `None`.
    pub fn from_message(message: ClientMessage) -> Option<Self> {
        match message {
            ClientMessage::AddPlayer { player } => Some(Self::AddPlayer(player)),
            ClientMessage::MovePlayer { id, x, y } => Some(Self::MovePlayer { id, x, y }),
            ClientMessage::SetPlayerSheet { id, sheet } => {
                Some(Self::SetPlayerSheet { id, sheet })
            }
            ClientMessage::RemovePlayer { id } => Some(Self::RemovePlayer { id }),
            ClientMessage::SetWalls { walls } => Some(Self::SetWalls(walls)),
            ClientMessage::SetTurnOrder { order } => Some(Self::SetTurnOrder(order)),
            ClientMessage::AdvanceTurn => Some(Self::AdvanceTurn),
            ClientMessage::LogEvent { text } => Some(Self::LogEvent(text)),
            ClientMessage::Join { .. } | ClientMessage::Unknown => None,
        }
    }
}

/// Server-side authoritative aggregate holding the session state.
pub struct SessionStore {
    state: RwLock<SessionState>,
    duplicate_ids: DuplicateIdPolicy,
}

impl SessionStore {
    pub fn new(duplicate_ids: DuplicateIdPolicy) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            duplicate_ids,
        }
    }

    /// A copy of the current canonical state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Apply a mutation. Returns the post-mutation snapshot to broadcast,
    /// or `None` when the intent was ignored (unknown record id, rejected
    /// duplicate) - a benign race, not an error.
    pub async fn apply(&self, mutation: Mutation) -> Option<SessionState> {
        let mut state = self.state.write().await;
        let accepted = match mutation {
            Mutation::AddPlayer(mut player) => {
                player.ensure_sheet();
                match self.duplicate_ids {
                    DuplicateIdPolicy::Append => {
                        state.players.push(player);
                        true
                    }
                    DuplicateIdPolicy::Replace => {
                        match state.find_player_mut(&player.id) {
                            Some(existing) => *existing = player,
                            None => state.players.push(player),
                        }
                        true
                    }
                    DuplicateIdPolicy::Reject => {
                        if state.find_player(&player.id).is_some() {
                            tracing::debug!(id = %player.id, "Rejected duplicate record id");
                            false
                        } else {
                            state.players.push(player);
                            true
                        }
                    }
                }
            }
            Mutation::MovePlayer { id, x, y } => match state.find_player_mut(&id) {
                Some(player) => {
                    player.x = x;
                    player.y = y;
                    true
                }
                None => {
                    tracing::debug!(id = %id, "movePlayer for unknown record, ignoring");
                    false
                }
            },
            // No authority check here: the client UI gates sheet edits by
            // role/ownership, and the engine trusts it. Deliberate,
            // documented trust boundary; hardening would call
            // CharacterRecord::can_edit with the sender's identity.
            Mutation::SetPlayerSheet { id, sheet } => match state.find_player_mut(&id) {
                Some(player) => {
                    player.sheet = Some(sheet);
                    true
                }
                None => {
                    tracing::debug!(id = %id, "setPlayerSheet for unknown record, ignoring");
                    false
                }
            },
            Mutation::RemovePlayer { id } => {
                let before = state.players.len();
                state.players.retain(|p| p.id != id);
                if state.players.len() == before {
                    tracing::debug!(id = %id, "removePlayer for unknown record, ignoring");
                    false
                } else {
                    state.turn_order.retain(|t| *t != id);
                    clamp_turn(&mut state);
                    true
                }
            }
            Mutation::SetWalls(walls) => {
                state.walls = walls;
                true
            }
            Mutation::SetTurnOrder(order) => {
                state.turn_order = order;
                clamp_turn(&mut state);
                true
            }
            Mutation::AdvanceTurn => {
                if state.turn_order.is_empty() {
                    false
                } else {
                    state.current_turn = (state.current_turn + 1) % state.turn_order.len();
                    true
                }
            }
            Mutation::LogEvent(text) => {
                state.event_log.push(text);
                true
            }
        };

        accepted.then(|| state.clone())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DuplicateIdPolicy::default())
    }
}

fn clamp_turn(state: &mut SessionState) {
    if state.turn_order.is_empty() {
        state.current_turn = 0;
    } else {
        state.current_turn %= state.turn_order.len();
    }
}
