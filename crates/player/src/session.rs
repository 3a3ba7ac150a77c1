//! Client-side session state and edit tracking.
//!
//! `ClientSession` mirrors the engine's authoritative state and layers the
//! local edit buffer on top of it. Edits write through to the local copy
//! immediately so the UI never waits on the server; each edit arms a
//! debounce generation, and only the flush matching the latest generation
//! actually sends the sheet.
//!
//! Reconciliation rule: an incoming snapshot replaces everything EXCEPT the
//! `sheet.parsed` tree of records with unflushed edits. Without this, a
//! broadcast triggered by another participant mid-typing would wipe the
//! local keystrokes before the debounce fires.

use std::collections::HashMap;

use serde_json::Value;

use tabletide_domain::{sheet, RecordId, SheetContainer};
use tabletide_protocol::SessionState;

/// Local mirror of the session plus the per-record edit buffer.
#[derive(Debug, Default)]
pub struct ClientSession {
    state: SessionState,
    /// Records with unflushed edits, mapped to their latest debounce
    /// generation. A timer firing for an older generation is stale.
    pending: HashMap<RecordId, u64>,
    next_generation: u64,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the mirrored state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a record has unflushed edits.
    pub fn has_pending(&self, id: &RecordId) -> bool {
        self.pending.contains_key(id)
    }

    /// Apply a field edit to the local copy of a record's sheet.
    ///
    /// Returns the debounce generation the caller should arm a timer for,
    /// or `None` when the record is unknown locally. Repeated edits to the
    /// same record supersede the previous generation, so only the last
    /// timer in a burst results in a send.
    pub fn edit_field(&mut self, id: &RecordId, path: &str, value: Value) -> Option<u64> {
        let record = self.state.find_player_mut(id)?;
        record.ensure_sheet();

        // The canonical name field also drives the record's display name.
        if path == "name" {
            if let Some(name) = value.as_str() {
                record.name = name.to_string();
            }
        }

        if let Some(container) = record.sheet.as_mut() {
            sheet::set_path(&mut container.parsed, path, value);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.pending.insert(id.clone(), generation);
        Some(generation)
    }

    /// Resolve a debounce timer.
    ///
    /// Returns the sheet to send only when `generation` is still the
    /// latest for this record; a superseded timer clears nothing and
    /// sends nothing. The pending entry is consumed on a successful
    /// flush, so the next snapshot is free to overwrite the record.
    pub fn flush(&mut self, id: &RecordId, generation: u64) -> Option<SheetContainer> {
        match self.pending.get(id) {
            Some(&latest) if latest == generation => {
                self.pending.remove(id);
                self.state.find_player(id).and_then(|r| r.sheet.clone())
            }
            _ => None,
        }
    }

    /// Replace the mirrored state with an authoritative snapshot.
    ///
    /// Records with unflushed edits keep their local `sheet.parsed` tree;
    /// everything else (position, ownership, other records, walls, turn
    /// order) is taken from the snapshot. A pending record the snapshot no
    /// longer contains is dropped along with its buffered edits.
    pub fn apply_snapshot(&mut self, mut incoming: SessionState) {
        for id in self.pending.keys() {
            let Some(local) = self.state.find_player(id) else {
                continue;
            };
            let Some(local_parsed) = local.parsed().cloned() else {
                continue;
            };
            if let Some(remote) = incoming.find_player_mut(id) {
                remote.ensure_sheet();
                if let Some(container) = remote.sheet.as_mut() {
                    container.parsed = local_parsed;
                }
            }
        }
        self.pending
            .retain(|id, _| incoming.find_player(id).is_some());
        self.state = incoming;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabletide_domain::CharacterRecord;

    fn session_with(records: Vec<CharacterRecord>) -> ClientSession {
        let mut session = ClientSession::new();
        session.apply_snapshot(SessionState {
            players: records,
            ..SessionState::default()
        });
        session
    }

    fn record(id: &str) -> CharacterRecord {
        CharacterRecord::new(id, "Mira", "user-a")
    }

    #[test]
    fn test_edit_writes_through_locally() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");

        let generation = session.edit_field(&id, "vitality.hp-current", json!(17));
        assert!(generation.is_some());

        let parsed = session.state().find_player(&id).unwrap().parsed().unwrap();
        assert_eq!(sheet::get_i64(parsed, "vitality.hp-current", 0), 17);
        assert!(session.has_pending(&id));
    }

    #[test]
    fn test_edit_unknown_record_is_ignored() {
        let mut session = session_with(vec![record("p1")]);
        let ghost = RecordId::new("ghost");

        assert!(session.edit_field(&ghost, "name", json!("X")).is_none());
        assert!(!session.has_pending(&ghost));
    }

    #[test]
    fn test_name_edit_updates_display_name() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");

        let _ = session.edit_field(&id, "name", json!("Miranda"));

        let rec = session.state().find_player(&id).unwrap();
        assert_eq!(rec.name, "Miranda");
        assert_eq!(
            sheet::get_string(rec.parsed().unwrap(), "name", "?"),
            "Miranda"
        );
    }

    #[test]
    fn test_flush_only_fires_for_latest_generation() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");

        let first = session.edit_field(&id, "info.class", json!("rogue")).unwrap();
        let second = session.edit_field(&id, "info.class", json!("bard")).unwrap();
        assert_ne!(first, second);

        // The superseded timer must not send anything.
        assert!(session.flush(&id, first).is_none());
        assert!(session.has_pending(&id));

        let sent = session.flush(&id, second).expect("latest flush sends");
        assert_eq!(sheet::get_string(&sent.parsed, "info.class", "?"), "bard");
        assert!(!session.has_pending(&id));
    }

    #[test]
    fn test_snapshot_preserves_pending_parsed_tree() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");
        let _ = session.edit_field(&id, "vitality.ac", json!(18));

        // Another participant moved the token; the broadcast must not wipe
        // the unflushed AC edit.
        let mut remote = record("p1");
        remote.x = 40.0;
        session.apply_snapshot(SessionState {
            players: vec![remote],
            ..SessionState::default()
        });

        let rec = session.state().find_player(&id).unwrap();
        assert_eq!(rec.x, 40.0);
        assert_eq!(sheet::get_i64(rec.parsed().unwrap(), "vitality.ac", 0), 18);
        assert!(session.has_pending(&id));
    }

    #[test]
    fn test_snapshot_overwrites_flushed_records() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");
        let generation = session.edit_field(&id, "vitality.ac", json!(18)).unwrap();
        let _ = session.flush(&id, generation);

        let remote = record("p1");
        session.apply_snapshot(SessionState {
            players: vec![remote],
            ..SessionState::default()
        });

        // Nothing pending, so the authoritative sheet wins.
        let rec = session.state().find_player(&id).unwrap();
        assert_eq!(sheet::get_i64(rec.parsed().unwrap(), "vitality.ac", -1), 0);
    }

    #[test]
    fn test_snapshot_drops_pending_for_removed_records() {
        let mut session = session_with(vec![record("p1")]);
        let id = RecordId::new("p1");
        let _ = session.edit_field(&id, "vitality.ac", json!(18));

        session.apply_snapshot(SessionState::default());

        assert!(session.state().players.is_empty());
        assert!(!session.has_pending(&id));
    }
}
