//! Schema fragments.
//!
//! A JSON-Schema-like document is read once into a closed [`Schema`] tree so
//! that the editor never performs stringly-typed lookups such as
//! `schema["properties"][key]` at edit time.

use indexmap::IndexMap;
use json_editor_pointer::{format_path, Path, PathStep};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema at {at:?} must be an object or a boolean")]
    NotAnObject { at: String },
    #[error("schema at {at:?} has unknown type {name:?}")]
    UnknownType { at: String, name: String },
    #[error("schema at {at:?} has malformed {field:?}")]
    InvalidField { at: String, field: &'static str },
}

/// Kinds of leaf values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// Fields common to all schema nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaBase {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    /// Set for boolean fields rendered as toggles.
    pub toggle_color: Option<String>,
    /// Field is shown (and pre-filled) even when absent from the record.
    pub always_show: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSchema {
    pub base: SchemaBase,
    pub kind: ScalarKind,
    pub enum_values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub base: SchemaBase,
    pub properties: IndexMap<String, Schema>,
    pub required: Vec<String>,
}

impl ObjectSchema {
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }

    pub fn property(&self, key: &str) -> Option<&Schema> {
        self.properties.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    pub base: SchemaBase,
    pub items: Option<Box<Schema>>,
}

/// A schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Scalar(ScalarSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
}

impl Schema {
    /// A scalar schema of the given kind with no extra attributes.
    pub fn scalar(kind: ScalarKind) -> Self {
        Schema::Scalar(ScalarSchema {
            base: SchemaBase::default(),
            kind,
            enum_values: Vec::new(),
        })
    }

    /// Reads a JSON-Schema-like document.
    ///
    /// # Errors
    ///
    /// Fails on non-object fragments, unknown `type` names and malformed
    /// `properties`, `items` or `required` entries.
    pub fn from_json(value: &Value) -> Result<Schema, SchemaError> {
        let mut at = Path::new();
        parse_node(value, &mut at)
    }

    /// Returns the type name of this fragment.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(s) => s.kind.as_str(),
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }

    pub fn base(&self) -> &SchemaBase {
        match self {
            Self::Scalar(s) => &s.base,
            Self::Object(s) => &s.base,
            Self::Array(s) => &s.base,
        }
    }

    /// Objects and arrays can be collapsed in tree views.
    pub fn is_collapsible(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    pub fn is_toggle(&self) -> bool {
        self.base().toggle_color.is_some()
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        match self {
            Self::Array(s) => Some(s),
            _ => None,
        }
    }

    /// Element schema of an array fragment.
    pub fn items(&self) -> Option<&Schema> {
        self.as_array().and_then(|a| a.items.as_deref())
    }

    /// Follows one path step: keys select properties, indices select items.
    pub fn child(&self, step: &PathStep) -> Option<&Schema> {
        match self {
            Self::Object(obj) => obj.properties.get(&step.to_key()),
            Self::Array(arr) => {
                step.as_index()?;
                arr.items.as_deref()
            }
            Self::Scalar(_) => None,
        }
    }

    /// Schema fragment describing the value at `path`.
    pub fn sub_schema(&self, path: &[PathStep]) -> Option<&Schema> {
        let mut current = self;
        for step in path {
            current = current.child(step)?;
        }
        Some(current)
    }
}

fn parse_node(value: &Value, at: &mut Path) -> Result<Schema, SchemaError> {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::Bool(_) => return Ok(Schema::scalar(ScalarKind::Any)),
        _ => {
            return Err(SchemaError::NotAnObject {
                at: format_path(at),
            })
        }
    };
    let base = parse_base(obj, at)?;
    let type_name = parse_type_name(obj, at)?;
    let inferred = match type_name.as_deref() {
        Some(name) => name,
        None if obj.contains_key("properties") => "object",
        None if obj.contains_key("items") => "array",
        None => "any",
    };
    let kind = match inferred {
        "object" => return parse_object(obj, base, at).map(Schema::Object),
        "array" => return parse_array(obj, base, at).map(Schema::Array),
        "string" => ScalarKind::String,
        "number" => ScalarKind::Number,
        "integer" => ScalarKind::Integer,
        "boolean" => ScalarKind::Boolean,
        "null" => ScalarKind::Null,
        "any" => ScalarKind::Any,
        other => {
            return Err(SchemaError::UnknownType {
                at: format_path(at),
                name: other.to_string(),
            })
        }
    };
    let enum_values = match obj.get("enum") {
        None => Vec::new(),
        Some(Value::Array(values)) => values.clone(),
        Some(_) => {
            return Err(SchemaError::InvalidField {
                at: format_path(at),
                field: "enum",
            })
        }
    };
    Ok(Schema::Scalar(ScalarSchema {
        base,
        kind,
        enum_values,
    }))
}

fn parse_type_name(obj: &Map<String, Value>, at: &Path) -> Result<Option<String>, SchemaError> {
    match obj.get("type") {
        None => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        // ["string", "null"] describes a nullable string
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let name = names
                .iter()
                .find(|name| **name != "null")
                .or_else(|| names.first());
            Ok(name.map(|name| name.to_string()))
        }
        Some(_) => Err(SchemaError::InvalidField {
            at: format_path(at),
            field: "type",
        }),
    }
}

fn parse_base(obj: &Map<String, Value>, at: &Path) -> Result<SchemaBase, SchemaError> {
    let string_field = |field: &'static str| -> Result<Option<String>, SchemaError> {
        match obj.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SchemaError::InvalidField {
                at: format_path(at),
                field,
            }),
        }
    };
    Ok(SchemaBase {
        title: string_field("title")?,
        description: string_field("description")?,
        default: obj.get("default").cloned(),
        toggle_color: string_field("toggleColor")?,
        always_show: obj.get("alwaysShow").and_then(Value::as_bool).unwrap_or(false),
        hidden: obj.get("hidden").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn parse_object(
    obj: &Map<String, Value>,
    base: SchemaBase,
    at: &mut Path,
) -> Result<ObjectSchema, SchemaError> {
    let mut properties = IndexMap::new();
    match obj.get("properties") {
        None => {}
        Some(Value::Object(props)) => {
            for (key, prop) in props {
                at.push(PathStep::Key(key.clone()));
                let parsed = parse_node(prop, at);
                at.pop();
                properties.insert(key.clone(), parsed?);
            }
        }
        Some(_) => {
            return Err(SchemaError::InvalidField {
                at: format_path(at),
                field: "properties",
            })
        }
    }
    let required = match obj.get("required") {
        None => Vec::new(),
        Some(Value::Array(keys)) => keys
            .iter()
            .map(|k| {
                k.as_str().map(str::to_string).ok_or_else(|| SchemaError::InvalidField {
                    at: format_path(at),
                    field: "required",
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SchemaError::InvalidField {
                at: format_path(at),
                field: "required",
            })
        }
    };
    Ok(ObjectSchema {
        base,
        properties,
        required,
    })
}

fn parse_array(
    obj: &Map<String, Value>,
    base: SchemaBase,
    at: &mut Path,
) -> Result<ArraySchema, SchemaError> {
    let items = match obj.get("items") {
        None => None,
        // tuple form: the first entry describes the rows the editor creates
        Some(Value::Array(tuple)) => match tuple.first() {
            Some(first) => Some(parse_item(first, at)?),
            None => None,
        },
        Some(item) => Some(parse_item(item, at)?),
    };
    Ok(ArraySchema { base, items })
}

fn parse_item(item: &Value, at: &mut Path) -> Result<Box<Schema>, SchemaError> {
    at.push(PathStep::Index(0));
    let parsed = parse_node(item, at);
    at.pop();
    parsed.map(Box::new)
}
