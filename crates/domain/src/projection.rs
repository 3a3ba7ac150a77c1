//! Render-ready projection of a parsed sheet.
//!
//! `project` flattens the loose sheet tree into display strings the sheet
//! viewer can bind directly. It never mutates its input; all scalar
//! extraction goes through the tolerant accessors and defaults to a dash.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sheet::{self, ABILITY_KEYS, COIN_KEYS};

/// One ability line: key plus display strings for score and modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityEntry {
    pub key: String,
    pub score: String,
    pub modifier: String,
}

/// One weapon line. Entries with no resolvable name are dropped before
/// this type is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponEntry {
    pub name: String,
    pub bonus: String,
    pub damage: String,
}

/// Coin totals per denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoinSummary {
    pub cp: i64,
    pub sp: i64,
    pub ep: i64,
    pub gp: i64,
    pub pp: i64,
}

/// Flat summary of a sheet for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub name: String,
    pub class: String,
    pub level: String,
    pub race: String,
    pub background: String,
    pub alignment: String,
    pub hp_max: String,
    pub hp_current: String,
    pub armor_class: String,
    pub speed: String,
    pub abilities: Vec<AbilityEntry>,
    pub weapons: Vec<WeaponEntry>,
    /// `None` when the sheet has no coin data at all, as opposed to a
    /// purse that exists but is empty
    pub coins: Option<CoinSummary>,
}

/// Derive a view model from a parsed sheet. Pure: the input is not mutated.
pub fn project(parsed: &Value, fallback_name: &str) -> SheetView {
    let abilities = ABILITY_KEYS
        .iter()
        .map(|key| AbilityEntry {
            key: key.to_string(),
            score: sheet::get_display(parsed, &format!("stats.{key}.score")),
            modifier: sheet::get_display(parsed, &format!("stats.{key}.modifier")),
        })
        .collect();

    let weapons = parsed
        .get("weaponsList")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let name = sheet::get_string(entry, "name", "");
                    if name.trim().is_empty() {
                        return None;
                    }
                    Some(WeaponEntry {
                        name,
                        bonus: sheet::get_display(entry, "bonus"),
                        damage: sheet::get_display(entry, "damage"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let coins = match sheet::get_path(parsed, "coins") {
        Some(purse) => Some(CoinSummary {
            cp: coin(purse, COIN_KEYS[0]),
            sp: coin(purse, COIN_KEYS[1]),
            ep: coin(purse, COIN_KEYS[2]),
            gp: coin(purse, COIN_KEYS[3]),
            pp: coin(purse, COIN_KEYS[4]),
        }),
        None => None,
    };

    SheetView {
        name: sheet::get_string(parsed, "name", fallback_name),
        class: sheet::get_display(parsed, "info.class"),
        level: sheet::get_display(parsed, "info.level"),
        race: sheet::get_display(parsed, "info.race"),
        background: sheet::get_display(parsed, "info.background"),
        alignment: sheet::get_display(parsed, "info.alignment"),
        hp_max: sheet::get_display(parsed, "vitality.hp-max"),
        hp_current: sheet::get_display(parsed, "vitality.hp-current"),
        armor_class: sheet::get_display(parsed, "vitality.ac"),
        speed: sheet::get_display(parsed, "vitality.speed"),
        abilities,
        weapons,
        coins,
    }
}

fn coin(purse: &Value, key: &str) -> i64 {
    sheet::get_i64(purse, &format!("{key}.value"), 0)
}
