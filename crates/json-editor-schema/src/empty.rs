//! Schema-derived empty values.
//!
//! Rows and fields created by the editor are filled with placeholder values
//! that match the shape the schema expects, never with copies of user data.

use json_editor_pointer::PathStep;
use serde_json::{Map, Number, Value};

use crate::schema::{ScalarKind, Schema};

/// Synthesizes the empty value for a schema fragment.
///
/// An explicit `default` wins. Objects contain every property that is
/// required, marked `alwaysShow`, or carries a default.
pub fn empty_value(schema: &Schema) -> Value {
    if let Some(default) = &schema.base().default {
        return default.clone();
    }
    match schema {
        Schema::Scalar(s) => match s.kind {
            ScalarKind::String | ScalarKind::Any => Value::String(String::new()),
            ScalarKind::Number | ScalarKind::Integer => Value::Number(Number::from(0)),
            ScalarKind::Boolean => Value::Bool(false),
            ScalarKind::Null => Value::Null,
        },
        Schema::Array(_) => Value::Array(Vec::new()),
        Schema::Object(obj) => {
            let mut map = Map::new();
            for (key, prop) in &obj.properties {
                let base = prop.base();
                if obj.is_required(key) || base.always_show || base.default.is_some() {
                    map.insert(key.clone(), empty_value(prop));
                }
            }
            Value::Object(map)
        }
    }
}

/// Like [`empty_value`], but tolerates a missing fragment by falling back to
/// an empty string.
pub fn empty_value_or_default(schema: Option<&Schema>) -> Value {
    match schema {
        Some(schema) => empty_value(schema),
        None => {
            tracing::warn!("no schema fragment for empty value, using empty string");
            Value::String(String::new())
        }
    }
}

/// Empty value for the location `path` below `root`.
pub fn empty_value_at(root: &Schema, path: &[PathStep]) -> Value {
    let fragment = root.sub_schema(path);
    if fragment.is_none() {
        tracing::warn!(
            path = %json_editor_pointer::format_path(path),
            "schema lookup failed"
        );
    }
    empty_value_or_default(fragment)
}

/// Empty row shaped like `template`.
///
/// Table rows are expected to share their columns, so every key of the
/// template is kept (reset to its own empty value) ahead of the keys
/// [`empty_value`] would add on its own.
pub fn empty_value_like(schema: &Schema, template: &Value) -> Value {
    match (schema, template, empty_value(schema)) {
        (Schema::Object(obj), Value::Object(columns), Value::Object(base)) => {
            let mut row = Map::new();
            for key in columns.keys() {
                row.insert(key.clone(), empty_value_or_default(obj.property(key)));
            }
            for (key, value) in base {
                if !row.contains_key(&key) {
                    row.insert(key, value);
                }
            }
            Value::Object(row)
        }
        (_, _, base) => base,
    }
}
