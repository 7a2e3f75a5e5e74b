//! Helpers that views use to lay out fields.

use indexmap::IndexSet;
use json_editor_schema::ObjectSchema;
use serde_json::{Map, Value};

/// Keys of a sub-record split by how they render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeysByType {
    pub toggles: Vec<String>,
    pub others: Vec<String>,
}

/// Splits the keys of `value` into toggle fields and everything else,
/// keeping record order.
pub fn keys_by_type(value: &Map<String, Value>, schema: &ObjectSchema) -> KeysByType {
    let mut keys = KeysByType::default();
    for key in value.keys() {
        let is_toggle = schema.property(key).is_some_and(|prop| prop.is_toggle());
        if is_toggle {
            keys.toggles.push(key.clone());
        } else {
            keys.others.push(key.clone());
        }
    }
    keys
}

/// Schema properties absent from `value`, in schema order. Hidden
/// properties are never offered.
pub fn missing_keys<'a>(value: &Map<String, Value>, schema: &'a ObjectSchema) -> Vec<&'a str> {
    schema
        .properties
        .iter()
        .filter(|(key, prop)| !value.contains_key(key.as_str()) && !prop.base().hidden)
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Column keys of a table of object rows: the union of every row's keys in
/// first-seen order.
pub fn table_columns(rows: &[Value]) -> Vec<String> {
    let mut columns = IndexSet::new();
    for row in rows {
        if let Some(row) = row.as_object() {
            for key in row.keys() {
                if !columns.contains(key.as_str()) {
                    columns.insert(key.clone());
                }
            }
        }
    }
    columns.into_iter().collect()
}

/// Options whose text starts with `prefix`, ignoring ASCII case.
pub fn filter_by_prefix<'a>(options: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.to_ascii_lowercase();
    options
        .into_iter()
        .filter(|option| option.to_ascii_lowercase().starts_with(&prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_editor_schema::Schema;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_json(&json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "core": {"type": "boolean", "toggleColor": "#3498db"},
                "citeable": {"type": "boolean", "toggleColor": "#2ecc71"},
                "_private_notes": {"type": "array", "hidden": true},
                "abstracts": {"type": "array"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_keys_by_type() {
        let schema = schema();
        let value = json!({"title": "t", "core": true, "extra": 1});
        let keys = keys_by_type(value.as_object().unwrap(), schema.as_object().unwrap());
        assert_eq!(keys.toggles, vec!["core"]);
        assert_eq!(keys.others, vec!["title", "extra"]);
    }

    #[test]
    fn test_missing_keys_skip_hidden() {
        let schema = schema();
        let value = json!({"title": "t"});
        assert_eq!(
            missing_keys(value.as_object().unwrap(), schema.as_object().unwrap()),
            vec!["core", "citeable", "abstracts"]
        );
    }

    #[test]
    fn test_table_columns_union() {
        let rows = [json!({"value": "a"}), json!({"schema": "x", "value": "b"}), json!("odd")];
        assert_eq!(table_columns(&rows), vec!["value", "schema"]);
    }

    #[test]
    fn test_filter_by_prefix() {
        let options = ["arXiv", "ADS", "CDS", "art"];
        assert_eq!(filter_by_prefix(options.iter().copied(), "ar"), vec!["arXiv", "art"]);
        assert_eq!(filter_by_prefix(options, ""), options.to_vec());
    }
}
