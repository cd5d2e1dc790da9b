//! Schema migration for loaded documents.
//!
//! Files carry no version tag, so upgrades are driven by which fields are
//! present. The transform is pure and idempotent: `migrate(migrate(x))`
//! equals `migrate(x)`. Unknown top-level and per-event keys are kept.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::money::Money;

/// Per-participant keys from the time when each student had their own
/// sale-based discount. The pooled `total_ventes` replaced them.
const LEGACY_PARTICIPANT_DISCOUNT_KEYS: [&str; 6] = [
    "vente",
    "ventes",
    "montant_vente",
    "montant_ventes",
    "remise",
    "reduction",
];

/// Upgrades a raw document to the current shape.
///
/// The result always has `events` and `student_events` objects, every event
/// carries the full set of fields, and the student index is reconciled with
/// the participant maps.
#[must_use]
pub fn migrate(raw: Value) -> Value {
    let mut root = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let events = match root.remove("events") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let mut events: Map<String, Value> = events
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(event) => {
                let event = migrate_event(&key, event);
                Some((key, Value::Object(event)))
            }
            _ => None,
        })
        .collect();

    let index = match root.remove("student_events") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let index = reconcile_index(&mut events, index);

    root.insert("events".to_owned(), Value::Object(events));
    root.insert("student_events".to_owned(), Value::Object(index));
    Value::Object(root)
}

fn migrate_event(key: &str, mut event: Map<String, Value>) -> Map<String, Value> {
    event.insert("id".to_owned(), Value::String(key.to_owned()));
    if !event.get("nom").is_some_and(Value::is_string) {
        event.insert("nom".to_owned(), Value::String(key.to_owned()));
    }
    for text_key in ["date", "description"] {
        if !event.get(text_key).is_some_and(Value::is_string) {
            event.insert(text_key.to_owned(), Value::String(String::new()));
        }
    }
    if event
        .get("categorie")
        .is_some_and(|c| !c.is_string() && !c.is_null())
    {
        event.remove("categorie");
    }

    normalize_money(&mut event, "cout_total");
    if !event.get("ventes_activees").is_some_and(Value::is_boolean) {
        event.insert("ventes_activees".to_owned(), Value::Bool(false));
    }
    normalize_money(&mut event, "total_ventes");

    let participants = match event.remove("participants") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let participants: Map<String, Value> = participants
        .into_iter()
        .map(|(student, entry)| {
            let mut entry = match entry {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            for legacy in LEGACY_PARTICIPANT_DISCOUNT_KEYS {
                entry.remove(legacy);
            }
            normalize_money(&mut entry, "prix_base");
            normalize_money(&mut entry, "prix_final");
            (student, Value::Object(entry))
        })
        .collect();
    event.insert("participants".to_owned(), Value::Object(participants));

    event
}

/// Makes `map[key]` a JSON number that reads back as [`Money`]: numeric
/// strings are parsed, anything else (including absence and amounts out of
/// range) becomes `0`.
fn normalize_money(map: &mut Map<String, Value>, key: &str) {
    let number = match map.remove(key) {
        Some(Value::Number(n)) => Some(n),
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64),
        _ => None,
    };
    let normalized = number
        .map(Value::Number)
        .filter(|value| Money::deserialize(value).is_ok())
        .unwrap_or_else(|| json!(0));
    map.insert(key.to_owned(), normalized);
}

/// Rebuilds the student index so that a pair present on either side is
/// present on both. Pairs naming unknown events are dropped.
fn reconcile_index(
    events: &mut Map<String, Value>,
    index: Map<String, Value>,
) -> Map<String, Value> {
    let mut reconciled: Vec<(String, Vec<String>)> = Vec::new();

    for (student, list) in index {
        let Value::Array(ids) = list else { continue };
        let mut kept: Vec<String> = Vec::new();
        for id in ids {
            if let Value::String(id) = id {
                if events.contains_key(&id) && !kept.contains(&id) {
                    kept.push(id);
                }
            }
        }
        reconciled.push((student, kept));
    }

    for (event_id, event) in events.iter() {
        let Some(participants) = event.get("participants").and_then(Value::as_object) else {
            continue;
        };
        for student in participants.keys() {
            let position = reconciled.iter().position(|(s, _)| s == student);
            let list = match position {
                Some(i) => &mut reconciled[i].1,
                None => {
                    reconciled.push((student.clone(), Vec::new()));
                    let last = reconciled.len() - 1;
                    &mut reconciled[last].1
                }
            };
            if !list.contains(event_id) {
                list.push(event_id.clone());
            }
        }
    }

    for (student, ids) in &reconciled {
        for event_id in ids {
            let participants = events
                .get_mut(event_id)
                .and_then(|event| event.get_mut("participants"))
                .and_then(Value::as_object_mut);
            if let Some(participants) = participants {
                participants
                    .entry(student.clone())
                    .or_insert_with(|| json!({ "prix_base": 0, "prix_final": 0 }));
            }
        }
    }

    reconciled
        .into_iter()
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(student, ids)| {
            let ids = ids.into_iter().map(Value::String).collect();
            (student, Value::Array(ids))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_document() -> Value {
        json!({
            "events": {
                "sortie_musee": {
                    "nom": "Sortie au musée",
                    "date": "14/03/2025",
                    "cout_total": "450",
                    "participants": {
                        "1": { "prix_base": 150.0, "prix_final": 140.0, "vente": 10.0 },
                        "2": { "prix_base": 150.0, "remise": 5 },
                        "3": {}
                    }
                },
                "broken": "not an event"
            },
            "student_events": {
                "1": ["sortie_musee", "sortie_musee", "ghost"],
                "4": ["sortie_musee"]
            },
            "app_version": "1.2"
        })
    }

    #[test]
    fn test_migrate_adds_sales_defaults() {
        let migrated = migrate(legacy_document());

        let event = &migrated["events"]["sortie_musee"];
        assert_eq!(event["ventes_activees"], false);
        assert_eq!(event["total_ventes"], json!(0));
        assert_eq!(event["id"], "sortie_musee");
        assert_eq!(event["description"], "");
    }

    #[test]
    fn test_migrate_drops_legacy_participant_discounts_and_fills_prices() {
        let migrated = migrate(legacy_document());

        let participants = &migrated["events"]["sortie_musee"]["participants"];
        assert!(participants["1"].get("vente").is_none());
        assert!(participants["2"].get("remise").is_none());
        assert_eq!(participants["2"]["prix_final"], json!(0));
        assert_eq!(participants["3"], json!({ "prix_base": 0, "prix_final": 0 }));
    }

    #[test]
    fn test_migrate_parses_numeric_strings_in_money_fields() {
        let migrated = migrate(legacy_document());

        assert_eq!(migrated["events"]["sortie_musee"]["cout_total"], json!(450.0));
    }

    #[test]
    fn test_migrate_zeroes_amounts_out_of_range() {
        // Arrange
        let raw = json!({
            "events": {
                "gala": {
                    "nom": "Gala",
                    "cout_total": 1e300,
                    "total_ventes": "20000000000000",
                    "participants": { "1": { "prix_base": -1e20, "prix_final": 10000000000000_u64 } }
                }
            }
        });

        // Act
        let migrated = migrate(raw);

        // Assert
        let gala = &migrated["events"]["gala"];
        assert_eq!(gala["nom"], json!("Gala"));
        assert_eq!(gala["cout_total"], json!(0));
        assert_eq!(gala["total_ventes"], json!(0));
        assert_eq!(gala["participants"]["1"]["prix_base"], json!(0));
        assert_eq!(gala["participants"]["1"]["prix_final"], json!(10_000_000_000_000_u64));
        assert_eq!(migrate(migrated.clone()), migrated);
    }

    #[test]
    fn test_migrate_drops_non_object_events_and_keeps_unknown_keys() {
        let migrated = migrate(legacy_document());

        assert!(migrated["events"].get("broken").is_none());
        assert_eq!(migrated["app_version"], "1.2");
    }

    #[test]
    fn test_migrate_reconciles_student_index_with_participants() {
        let migrated = migrate(legacy_document());

        let index = &migrated["student_events"];
        assert_eq!(index["1"], json!(["sortie_musee"]));
        assert_eq!(index["2"], json!(["sortie_musee"]));
        assert_eq!(index["3"], json!(["sortie_musee"]));
        assert_eq!(index["4"], json!(["sortie_musee"]));
        assert!(migrated["events"]["sortie_musee"]["participants"]
            .get("4")
            .is_some());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let once = migrate(legacy_document());
        let twice = migrate(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_migrate_is_idempotent_for_degenerate_inputs() {
        for raw in [
            json!(null),
            json!([1, 2, 3]),
            json!({}),
            json!({ "events": [], "student_events": "x" }),
            json!({ "events": { "e": { "participants": [1] } }, "student_events": { "9": "e" } }),
        ] {
            let once = migrate(raw);
            assert_eq!(migrate(once.clone()), once);
            assert!(once["events"].is_object());
            assert!(once["student_events"].is_object());
        }
    }

    #[test]
    fn test_migrate_produces_an_empty_document_from_garbage() {
        let migrated = migrate(json!("garbage"));

        assert_eq!(migrated, json!({ "events": {}, "student_events": {} }));
    }
}
