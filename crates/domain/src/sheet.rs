//! Tolerant accessors for the semi-structured parsed sheet tree.
//!
//! A parsed sheet is a `serde_json::Value` rather than a rigid struct:
//! imported exports carry fields we do not know about, and leaf values may
//! be stored either as a bare scalar or wrapped as `{"value": scalar}`.
//! Readers in this module accept both forms and fall back instead of
//! failing; writers create intermediate nodes as needed.

use serde_json::{json, Map, Value};

/// The six ability keys, in display order.
pub const ABILITY_KEYS: [&str; 6] = ["str", "dex", "con", "int", "wis", "cha"];

/// Coin denominations, in display order (copper through platinum).
pub const COIN_KEYS: [&str; 5] = ["cp", "sp", "ep", "gp", "pp"];

/// Unwrap a `{"value": scalar}` leaf wrapper, if present.
///
/// Objects without a `value` key and non-object values are returned as-is.
pub fn unwrap_leaf(node: &Value) -> &Value {
    match node {
        Value::Object(map) => map.get("value").unwrap_or(node),
        _ => node,
    }
}

/// Resolve a dotted path through nested mappings.
///
/// Returns `None` on any resolution failure: a missing key, a `null`
/// intermediate, or a non-object node mid-path. The leaf is unwrapped
/// through the `{"value": …}` ambiguity, so `stats.str.score` finds both
/// `{"score": 14}` and `{"score": {"value": 14}}`. A trailing `value`
/// segment also tolerates the wrapper having been flattened away: if the
/// node is already a scalar, the segment resolves to the node itself.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        match node {
            Value::Object(map) => node = map.get(segment)?,
            // The wrapper may have been stored as the bare scalar; a
            // trailing `value` segment then addresses the node itself.
            _ if segment == "value" => {}
            _ => return None,
        }
    }
    let leaf = unwrap_leaf(node);
    (!leaf.is_null()).then_some(leaf)
}

/// Read a string at `path`, falling back when absent or not a string.
pub fn get_string(root: &Value, path: &str, fallback: &str) -> String {
    match get_path(root, path) {
        Some(Value::String(s)) => s.clone(),
        _ => fallback.to_string(),
    }
}

/// Read an integer at `path`, falling back when absent or not numeric.
///
/// String-typed digits are accepted; form inputs round-trip numbers as
/// strings.
pub fn get_i64(root: &Value, path: &str, fallback: i64) -> i64 {
    match get_path(root, path) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(fallback),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(fallback),
        _ => fallback,
    }
}

/// Read a display string at `path`, rendering unknowns as a dash.
///
/// Empty-string values count as "unknown" here: numeric fields cleared in a
/// form arrive as `""` and are stored that way, not coerced to zero.
pub fn get_display(root: &Value, path: &str) -> String {
    match get_path(root, path) {
        Some(Value::String(s)) if s.trim().is_empty() => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "-".to_string(),
    }
}

/// Write `value` through a dotted path, creating intermediate mapping nodes
/// as needed. Non-object intermediates are replaced; the last path segment
/// is overwritten unconditionally.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return; // unreachable: made an object above
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Build a fully-populated default parsed sheet.
///
/// Downstream readers never branch on absence: vitals are zeroed, all six
/// abilities start at score 10 / modifier 0, the weapon list is empty and
/// the coin purse is present but zeroed.
pub fn empty_parsed_sheet(fallback_name: &str) -> Value {
    let mut stats = Map::new();
    for key in ABILITY_KEYS {
        stats.insert(key.to_string(), json!({"score": 10, "modifier": 0}));
    }
    let mut coins = Map::new();
    for key in COIN_KEYS {
        coins.insert(key.to_string(), json!({"value": 0}));
    }
    json!({
        "name": {"value": fallback_name},
        "info": {
            "class": {"value": ""},
            "level": {"value": ""},
            "race": {"value": ""},
            "background": {"value": ""},
            "alignment": {"value": ""},
        },
        "vitality": {
            "hp-max": {"value": 0},
            "hp-current": {"value": 0},
            "ac": {"value": 0},
            "speed": {"value": 0},
        },
        "stats": Value::Object(stats),
        "weaponsList": [],
        "coins": Value::Object(coins),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path_absent_returns_none() {
        let sheet = json!({});
        assert_eq!(get_path(&sheet, "vitality.hp-max.value"), None);
    }

    #[test]
    fn test_get_path_null_intermediate_returns_none() {
        let sheet = json!({"vitality": null});
        assert_eq!(get_path(&sheet, "vitality.hp-max.value"), None);
    }

    #[test]
    fn test_get_path_null_leaf_returns_none() {
        let sheet = json!({"vitality": {"hp-max": null}});
        assert_eq!(get_path(&sheet, "vitality.hp-max.value"), None);
    }

    #[test]
    fn test_get_path_unwraps_value_wrapper() {
        let sheet = json!({"vitality": {"hp-max": {"value": 12}}});
        assert_eq!(
            get_path(&sheet, "vitality.hp-max.value"),
            Some(&json!(12))
        );
        // Addressing the wrapper itself also yields the unwrapped scalar.
        assert_eq!(get_path(&sheet, "vitality.hp-max"), Some(&json!(12)));
    }

    #[test]
    fn test_get_path_accepts_bare_scalar_leaf() {
        let sheet = json!({"vitality": {"hp-max": 12}});
        assert_eq!(
            get_path(&sheet, "vitality.hp-max.value"),
            Some(&json!(12))
        );
    }

    #[test]
    fn test_get_path_scalar_mid_path_fails() {
        let sheet = json!({"vitality": 5});
        assert_eq!(get_path(&sheet, "vitality.hp-max.value"), None);
    }

    #[test]
    fn test_get_display_dash_fallbacks() {
        let sheet = json!({"vitality": {"hp-max": {"value": ""}}});
        assert_eq!(get_display(&sheet, "vitality.hp-max.value"), "-");
        assert_eq!(get_display(&sheet, "vitality.hp-current.value"), "-");

        let sheet = json!({"vitality": {"hp-max": 7}});
        assert_eq!(get_display(&sheet, "vitality.hp-max.value"), "7");
    }

    #[test]
    fn test_get_i64_accepts_string_digits() {
        let sheet = json!({"coins": {"gp": {"value": "25"}}});
        assert_eq!(get_i64(&sheet, "coins.gp.value", 0), 25);
        assert_eq!(get_i64(&sheet, "coins.sp.value", 0), 0);
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut sheet = json!({});
        set_path(&mut sheet, "info.class.value", json!("Wizard"));
        assert_eq!(sheet, json!({"info": {"class": {"value": "Wizard"}}}));
    }

    #[test]
    fn test_set_path_overwrites_leaf() {
        let mut sheet = json!({"info": {"class": {"value": "Wizard"}}});
        set_path(&mut sheet, "info.class", json!("Rogue"));
        assert_eq!(sheet, json!({"info": {"class": "Rogue"}}));
    }

    #[test]
    fn test_set_path_replaces_scalar_intermediate() {
        let mut sheet = json!({"info": 3});
        set_path(&mut sheet, "info.class.value", json!("Bard"));
        assert_eq!(sheet, json!({"info": {"class": {"value": "Bard"}}}));
    }

    #[test]
    fn test_set_path_keeps_empty_string() {
        let mut sheet = empty_parsed_sheet("Aria");
        set_path(&mut sheet, "vitality.hp-max.value", json!(""));
        assert_eq!(
            get_path(&sheet, "vitality.hp-max.value"),
            Some(&json!(""))
        );
        assert_eq!(get_display(&sheet, "vitality.hp-max.value"), "-");
    }

    #[test]
    fn test_empty_sheet_defaults() {
        let sheet = empty_parsed_sheet("Aria");
        assert_eq!(get_string(&sheet, "name", "?"), "Aria");
        for key in ABILITY_KEYS {
            assert_eq!(get_i64(&sheet, &format!("stats.{key}.score"), -1), 10);
            assert_eq!(get_i64(&sheet, &format!("stats.{key}.modifier"), -1), 0);
        }
        for key in COIN_KEYS {
            assert_eq!(get_i64(&sheet, &format!("coins.{key}.value"), -1), 0);
        }
        assert_eq!(sheet["weaponsList"], json!([]));
    }
}
