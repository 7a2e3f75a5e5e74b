//! Type definitions for document paths.

use std::fmt;

/// A step in a document path.
///
/// Object keys and array indices are distinct variants so that a path can be
/// followed without guessing, but lookups stay tolerant: an `Index` step on an
/// object matches the decimal key and a numeric `Key` step on an array matches
/// the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A document path. The empty path denotes the root.
pub type Path = Vec<PathStep>;

impl PathStep {
    /// Returns the array index this step addresses, if any.
    ///
    /// A `Key` holding a canonical non-negative integer also counts.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(idx) => Some(*idx),
            PathStep::Key(key) if crate::is_valid_index(key) => key.parse().ok(),
            PathStep::Key(_) => None,
        }
    }

    /// Returns the object key this step addresses.
    pub fn to_key(&self) -> String {
        match self {
            PathStep::Key(key) => key.clone(),
            PathStep::Index(idx) => idx.to_string(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathStep::Index(_))
    }
}

impl From<usize> for PathStep {
    fn from(idx: usize) -> Self {
        PathStep::Index(idx)
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => f.write_str(&crate::escape_component(key)),
            PathStep::Index(idx) => write!(f, "{idx}"),
        }
    }
}
