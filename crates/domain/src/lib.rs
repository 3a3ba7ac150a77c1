//! Tabletide Domain - character records and sheet data
//!
//! This crate contains the data model shared by the engine (server) and
//! player (client):
//! - `record` - character records, sheet containers, authority helpers
//! - `sheet` - tolerant accessors over the semi-structured parsed sheet tree
//! - `projection` - render-ready view derived from a parsed sheet
//! - `import` - charbox export file parsing
//!
//! # Design Principles
//!
//! 1. **Tolerant reads** - imported sheets have loose shapes; every read
//!    falls back instead of failing
//! 2. **No I/O** - pure data types and logic, usable from both sides of the
//!    wire
//! 3. **Forward compatible** - unknown fields are carried, not rejected

pub mod ids;
pub mod import;
pub mod projection;
pub mod record;
pub mod sheet;

pub use ids::RecordId;
pub use import::{import_character_export, ImportError};
pub use projection::{project, AbilityEntry, CoinSummary, SheetView, WeaponEntry};
pub use record::{CharacterRecord, ParticipantRole, SheetContainer, SheetSource};
pub use sheet::{empty_parsed_sheet, get_display, get_i64, get_path, get_string, set_path};
