//! `json-editor-schema` — schema fragments for the json-editor core.
//!
//! The editor is driven by a JSON-Schema-like description of the record. This
//! crate reads that description into a closed [`Schema`] type, answers
//! capability queries (`is_collapsible`, `is_toggle`), resolves the fragment
//! for a document path, and synthesizes schema-conformant empty values.

pub mod empty;
pub mod schema;

pub use empty::{empty_value, empty_value_at, empty_value_like, empty_value_or_default};
pub use schema::{
    ArraySchema, ObjectSchema, ScalarKind, ScalarSchema, Schema, SchemaBase, SchemaError,
};
