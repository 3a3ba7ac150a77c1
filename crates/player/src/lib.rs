//! Tabletide Player client library.
//!
//! Everything a client UI needs to participate in a session:
//!
//! - `client` - the WebSocket transport to the engine
//! - `session` - the local state mirror and edit tracking
//! - `edit_buffer` - debounced delivery of sheet edits

pub mod client;
pub mod edit_buffer;
pub mod session;

pub use client::{ClientError, EngineClient};
pub use edit_buffer::{EditBuffer, Outbound, EDIT_DEBOUNCE};
pub use session::ClientSession;
