use crate::extract::Record;
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between parent and child keys of nested objects
pub const KEY_SEPARATOR: &str = "_";

/// Flattens a record into string cells for delimited output
///
/// Nested objects become `parent_child` keys; arrays are kept as JSON text;
/// null becomes an empty cell and an empty object becomes `{}`. Every field
/// name of the record keeps a column: when an object's flattened keys would
/// clash with another field or with each other, the whole object is stored
/// as JSON text under its own name instead.
pub fn flatten_record(record: &Record) -> BTreeMap<String, String> {
    let mut cells = BTreeMap::new();
    cells.insert("source_url".to_string(), record.source_url.clone());
    cells.insert("fetched_at".to_string(), record.fetched_at.to_rfc3339());

    for (key, value) in &record.fields {
        if !value.is_object() {
            cells.insert(key.clone(), leaf_text(value));
            continue;
        }

        let mut nested = BTreeMap::new();
        let unique = flatten_value(key, value, &mut nested);
        let clashes = nested.keys().any(|nested_key| {
            nested_key != key
                && (record.fields.contains_key(nested_key) || cells.contains_key(nested_key))
        });
        if unique && !clashes {
            cells.extend(nested);
        } else {
            cells.insert(key.clone(), value.to_string());
        }
    }
    cells
}

/// Collects the leaves of `value`; false if two paths produced the same key
fn flatten_value(key: &str, value: &Value, cells: &mut BTreeMap<String, String>) -> bool {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let mut unique = true;
            for (child, nested) in map {
                let nested_key = format!("{}{}{}", key, KEY_SEPARATOR, child);
                unique &= flatten_value(&nested_key, nested, cells);
            }
            unique
        }
        _ => cells.insert(key.to_string(), leaf_text(value)).is_none(),
    }
}

fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
