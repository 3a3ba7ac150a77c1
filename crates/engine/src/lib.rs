//! Tabletide Engine library.
//!
//! This crate contains all server-side code for the Tabletide session
//! server.
//!
//! ## Structure
//!
//! - `store` - the authoritative session store and mutation entry point
//! - `connections` - connected-client tracking and broadcast fan-out
//! - `ws` - the WebSocket endpoint wiring the two together

pub mod connections;
pub mod store;
pub mod ws;


pub use connections::ConnectionManager;
pub use store::{DuplicateIdPolicy, Mutation, SessionStore};
pub use ws::{router, WsState};
