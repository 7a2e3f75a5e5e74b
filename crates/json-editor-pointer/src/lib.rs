//! Slash-delimited document paths.
//!
//! Paths address locations in a JSON document as an ordered list of
//! [`PathStep`]s. The string form follows [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! escaping, so `/references/0/raw_refs` and `["references", 0, "raw_refs"]`
//! describe the same location.
//!
//! # Example
//!
//! ```
//! use json_editor_pointer::{format_path, get, parse_path, PathStep};
//!
//! let path = parse_path("/keywords/0/value");
//! assert_eq!(
//!     path,
//!     vec![
//!         PathStep::Key("keywords".to_string()),
//!         PathStep::Index(0),
//!         PathStep::Key("value".to_string()),
//!     ]
//! );
//! assert_eq!(format_path(&path), "/keywords/0/value");
//!
//! let doc = serde_json::json!({"keywords": [{"value": "a"}]});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!("a")));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, PathStep};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("root path has no parent")]
    NoParent,
    #[error("invalid array index: {0}")]
    InvalidIndex(String),
}

/// Unescapes a path component.
///
/// `~1` is replaced with `/` and `~0` with `~`.
///
/// ```
/// use json_editor_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 before ~0, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a path component.
///
/// ```
/// use json_editor_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parses a slash-delimited path string.
///
/// - `""` is the root path.
/// - The leading `/` is optional.
/// - Canonical non-negative integers become [`PathStep::Index`], everything
///   else a [`PathStep::Key`].
///
/// ```
/// use json_editor_pointer::{parse_path, PathStep};
///
/// assert!(parse_path("").is_empty());
/// assert_eq!(parse_path("/a/1"), parse_path("a/1"));
/// assert_eq!(parse_path("/a/01")[1], PathStep::Key("01".to_string()));
/// ```
pub fn parse_path(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    body.split('/').map(parse_component).collect()
}

fn parse_component(raw: &str) -> PathStep {
    let component = unescape_component(raw);
    if is_valid_index(&component) {
        if let Ok(idx) = component.parse::<usize>() {
            return PathStep::Index(idx);
        }
    }
    PathStep::Key(component)
}

/// Formats a path into its slash-delimited string form.
///
/// ```
/// use json_editor_pointer::{format_path, PathStep};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(
///     format_path(&[PathStep::Key("a/b".to_string()), PathStep::Index(2)]),
///     "/a~1b/2"
/// );
/// ```
pub fn format_path(path: &[PathStep]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    for step in path {
        out.push('/');
        out.push_str(&step.to_string());
    }
    out
}

/// Check if a path points to the document root.
pub fn is_root(path: &[PathStep]) -> bool {
    path.is_empty()
}

/// Check if `child` lies strictly below `parent`.
///
/// ```
/// use json_editor_pointer::{is_child, parse_path};
///
/// assert!(is_child(&parse_path("/a"), &parse_path("/a/0")));
/// assert!(!is_child(&parse_path("/a/0"), &parse_path("/a")));
/// ```
pub fn is_child(parent: &[PathStep], child: &[PathStep]) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

/// Get the parent path of a given path.
///
/// # Errors
///
/// Returns [`PathError::NoParent`] for the root path.
pub fn parent(path: &[PathStep]) -> Result<Path, PathError> {
    split_last(path).map(|(parent, _)| parent.to_vec())
}

/// Splits a path into its parent and its last step.
///
/// # Errors
///
/// Returns [`PathError::NoParent`] for the root path.
pub fn split_last(path: &[PathStep]) -> Result<(&[PathStep], &PathStep), PathError> {
    match path.split_last() {
        Some((last, parent)) => Ok((parent, last)),
        None => Err(PathError::NoParent),
    }
}

/// Check if a string is a canonical non-negative integer array index.
///
/// ```
/// use json_editor_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

/// Follows a single step from `val`.
pub fn step<'a>(val: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match val {
        Value::Array(arr) => arr.get(step.as_index()?),
        Value::Object(map) => match step {
            PathStep::Key(key) => map.get(key),
            PathStep::Index(idx) => map.get(&idx.to_string()),
        },
        _ => None,
    }
}

/// Get a value from a JSON document by path.
///
/// Returns `None` when the path runs through a scalar, past the end of an
/// array, or into a missing key.
///
/// ```
/// use json_editor_pointer::{get, parse_path};
/// use serde_json::json;
///
/// let doc = json!({"a": [1, 2]});
/// assert_eq!(get(&doc, &parse_path("/a/1")), Some(&json!(2)));
/// assert_eq!(get(&doc, &parse_path("/a/2")), None);
/// assert_eq!(get(&doc, &parse_path("/a/1/x")), None);
/// ```
pub fn get<'a>(val: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    let mut current = val;
    for path_step in path {
        current = step(current, path_step)?;
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON document by path.
pub fn get_mut<'a>(val: &'a mut Value, path: &[PathStep]) -> Option<&'a mut Value> {
    let mut current = val;
    for path_step in path {
        current = match current {
            Value::Array(arr) => arr.get_mut(path_step.as_index()?)?,
            Value::Object(map) => map.get_mut(&path_step.to_key())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`get`], but parses the path string first.
pub fn get_by_pointer<'a>(val: &'a Value, pointer: &str) -> Option<&'a Value> {
    get(val, &parse_path(pointer))
}
