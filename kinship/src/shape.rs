//! Row shaping: turn flat rows keyed by dotted output paths into nested
//! JSON objects.

use kinship_core::Row;
use serde_json::{Map, Value as JsonValue};

use crate::pagination::Page;

fn insert_path(object: &mut Map<String, JsonValue>, path: &str, value: JsonValue) {
    match path.split_once('.') {
        None => {
            object.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = object
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

// Drops null leaves below the top level and objects left empty. Returns
// false when `object` ended up empty.
fn compact(object: &mut Map<String, JsonValue>, top_level: bool) -> bool {
    object.retain(|_, value| match value {
        JsonValue::Object(child) => compact(child, false),
        JsonValue::Null => top_level,
        _ => true,
    });
    !object.is_empty()
}

/// Nest a flat row: `{"posts.title": "x"}` becomes `{"posts": {"title": "x"}}`.
///
/// Null values inside nested objects are dropped, and a nested object with
/// nothing left (a LEFT JOIN that matched no row) disappears entirely.
/// Top-level nulls are kept.
///
/// # Examples
///
/// ```
/// use kinship::shape::shape_row;
/// use serde_json::json;
///
/// let row = json!({"id": 1, "posts.id": null, "posts.title": null});
/// assert_eq!(shape_row(row.as_object().unwrap()), json!({"id": 1}));
/// ```
pub fn shape_row(row: &Row) -> JsonValue {
    let mut shaped = Map::new();
    for (path, value) in row {
        insert_path(&mut shaped, path, value.clone());
    }
    compact(&mut shaped, true);
    JsonValue::Object(shaped)
}

pub fn shape_rows(rows: &[Row]) -> Vec<JsonValue> {
    rows.iter().map(shape_row).collect()
}

impl Page<Row> {
    /// The same page with every row shaped
    pub fn shaped(self) -> Page<JsonValue> {
        Page {
            rows: shape_rows(&self.rows),
            next_cursor: self.next_cursor,
        }
    }
}
