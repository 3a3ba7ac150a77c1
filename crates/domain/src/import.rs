//! Charbox export file parsing.
//!
//! Exports come in two shapes: a plain JSON character document, or an
//! envelope `{"data": "<json-encoded string>"}` where the character is
//! double-encoded inside the `data` field. Only an unparseable outer
//! document is an error; a bad inner document silently falls back to
//! treating the envelope itself as the character.

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::record::{SheetContainer, SheetSource};

/// Import failure surfaced to the initiating user.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file is not valid JSON at all.
    #[error("malformed character export: {0}")]
    MalformedImport(#[from] serde_json::Error),
}

/// Parse an externally authored character export into a sheet container.
///
/// The outer envelope is kept verbatim in `raw` for audit and re-export;
/// `parsed` holds the working tree (the inner document when the export is
/// double-encoded, the outer one otherwise).
pub fn import_character_export(file_text: &str) -> Result<SheetContainer, ImportError> {
    let outer: Value = serde_json::from_str(file_text)?;

    let parsed = match outer.get("data").and_then(Value::as_str) {
        Some(inner_text) => {
            serde_json::from_str(inner_text).unwrap_or_else(|_| outer.clone())
        }
        None => outer.clone(),
    };

    Ok(SheetContainer {
        source: SheetSource::Charbox,
        imported_at: Utc::now(),
        raw: outer,
        parsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet;
    use serde_json::json;

    #[test]
    fn test_import_plain_document() {
        let container =
            import_character_export(r#"{"name": {"value": "Aria"}}"#).expect("imports");
        assert_eq!(container.source, SheetSource::Charbox);
        assert_eq!(sheet::get_string(&container.parsed, "name", "?"), "Aria");
        assert_eq!(container.raw, container.parsed);
    }

    #[test]
    fn test_import_double_encoded_envelope() {
        let container =
            import_character_export(r#"{"data": "{\"name\":{\"value\":\"Aria\"}}"}"#)
                .expect("imports");
        assert_eq!(sheet::get_string(&container.parsed, "name", "?"), "Aria");
        // The envelope is retained untouched.
        assert_eq!(
            container.raw,
            json!({"data": "{\"name\":{\"value\":\"Aria\"}}"})
        );
    }

    #[test]
    fn test_import_bad_inner_falls_back_to_outer() {
        let container =
            import_character_export(r#"{"data": "not json", "name": "Aria"}"#).expect("imports");
        assert_eq!(container.parsed, json!({"data": "not json", "name": "Aria"}));
    }

    #[test]
    fn test_import_non_string_data_is_outer() {
        let container =
            import_character_export(r#"{"data": {"name": "Aria"}}"#).expect("imports");
        assert_eq!(container.parsed, json!({"data": {"name": "Aria"}}));
    }

    #[test]
    fn test_import_malformed_outer_fails() {
        let err = import_character_export("definitely not json").expect_err("must fail");
        assert!(matches!(err, ImportError::MalformedImport(_)));
    }
}
