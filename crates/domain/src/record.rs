//! Character records and sheet containers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::RecordId;
use crate::sheet;

/// Where a sheet's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetSource {
    /// Edited by hand in the sheet editor
    Manual,
    /// Imported from a charbox export file
    Charbox,
}

/// A participant's declared role in the session.
///
/// The role is client-declared, not authenticated; it gates editing in the
/// client UI and is deliberately not re-validated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantRole {
    /// Game master - may edit every record
    Gm,
    /// Player - may edit owned records only. Unknown role strings land
    /// here for forward compatibility.
    #[serde(other)]
    Player,
}

impl Default for ParticipantRole {
    fn default() -> Self {
        Self::Player
    }
}

/// The sheet attached to a character record.
///
/// `raw` keeps the original imported payload verbatim for audit/re-export;
/// `parsed` is the working tree that all reads and writes go through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetContainer {
    pub source: SheetSource,
    pub imported_at: DateTime<Utc>,
    #[serde(default)]
    pub raw: Value,
    #[serde(default)]
    pub parsed: Value,
}

impl SheetContainer {
    /// A manually-authored sheet wrapping the given parsed tree.
    pub fn manual(parsed: Value) -> Self {
        Self {
            source: SheetSource::Manual,
            imported_at: Utc::now(),
            raw: Value::Null,
            parsed,
        }
    }
}

/// A character in the session: identity plus its sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Unique within the session, immutable once assigned
    pub id: RecordId,
    /// Display name, kept in sync with the sheet's canonical name field
    pub name: String,
    /// The connection/user that may edit this record unconditionally
    pub owner_id: String,
    /// Template record (cloned into live records) vs. active character
    #[serde(default)]
    pub is_base: bool,
    /// Board position
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Absent until materialized; a malformed incoming sheet is treated as
    /// absent rather than failing the whole record
    #[serde(default, deserialize_with = "lenient_sheet")]
    pub sheet: Option<SheetContainer>,
}

fn lenient_sheet<'de, D>(deserializer: D) -> Result<Option<SheetContainer>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl CharacterRecord {
    /// Create a record with a default manual sheet.
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let sheet = SheetContainer::manual(sheet::empty_parsed_sheet(&name));
        Self {
            id: id.into(),
            name,
            owner_id: owner_id.into(),
            is_base: false,
            x: 0.0,
            y: 0.0,
            sheet: Some(sheet),
        }
    }

    /// Whether `user_id` acting as `role` may mutate this record's sheet.
    pub fn can_edit(&self, user_id: &str, role: ParticipantRole) -> bool {
        role == ParticipantRole::Gm || self.owner_id == user_id
    }

    /// Guarantee a usable sheet before editing.
    ///
    /// A missing sheet is replaced with a fresh manual one; a sheet whose
    /// `parsed` tree is malformed (not a mapping) gets only that field
    /// repaired. Idempotent: a second call changes nothing.
    pub fn ensure_sheet(&mut self) {
        match self.sheet.as_mut() {
            None => {
                self.sheet = Some(SheetContainer::manual(sheet::empty_parsed_sheet(&self.name)));
            }
            Some(container) => {
                if !container.parsed.is_object() {
                    container.parsed = sheet::empty_parsed_sheet(&self.name);
                }
            }
        }
    }

    /// The parsed sheet tree, if the record has been materialized.
    pub fn parsed(&self) -> Option<&Value> {
        self.sheet.as_ref().map(|s| &s.parsed)
    }
}
