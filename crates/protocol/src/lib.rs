//! Tabletide Protocol - shared types for Engine and Player communication
//!
//! This crate contains everything that crosses the WebSocket between the
//! engine (server) and player (client):
//! - WebSocket message types (`ClientMessage`, `ServerMessage`)
//! - The full-state snapshot (`SessionState`)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json and the domain crate only
//! 2. **No business logic** - pure data types and serialization
//! 3. **Full-state snapshots** - every broadcast carries the complete
//!    session; there is no delta format and no sequence numbering

pub mod messages;
pub mod state;

pub use messages::{ClientMessage, ServerMessage};
pub use state::SessionState;

// Re-export the domain types that appear in wire payloads.
pub use tabletide_domain::{CharacterRecord, ParticipantRole, RecordId, SheetContainer};
