use json_editor_schema::SchemaError;
use thiserror::Error;

use crate::previews::PreviewError;
use crate::shortcut::ChordError;
use crate::tabs::TabsError;

/// Failures of a single store mutation. A failing mutation aborts its whole
/// batch and leaves the document untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no value at {0:?}")]
    NotFound(String),
    #[error("value at {0:?} is not a container")]
    NotAContainer(String),
    #[error("value at {0:?} is not an array")]
    NotAnArray(String),
    #[error("{index:?} is not an index into the array at {path:?}")]
    InvalidIndex { path: String, index: String },
    #[error("index {index} out of bounds for array at {path:?} of length {len}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("the document root cannot be removed")]
    RootRemoval,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("path {0:?} is not inside an array row")]
    NotARow(String),
    #[error("schema at {0:?} does not describe an array")]
    NotAnArraySchema(String),
    #[error("edit at {0:?} targets a row that no longer exists")]
    StaleEdit(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced while setting up or driving an editor session.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Tabs(#[from] TabsError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error(transparent)]
    Chord(#[from] ChordError),
    #[error(transparent)]
    Edit(#[from] EditError),
}
