//! `json-editor` — core of a schema-driven JSON record editor.
//!
//! The record lives in a [`DocumentStore`] as a persistent tree. Views read
//! the current root and subscribe to change events; every edit goes through
//! the store, either directly or through the [`StructuralEditEngine`] which
//! inserts, copies, moves and deletes array rows using schema-derived empty
//! values. The [`ShortcutDispatcher`] maps keyboard chords to those row
//! operations and [`JsonEditor`] ties everything into one session.
//!
//! Paths come from `json-editor-pointer` and schema fragments from
//! `json-editor-schema`; both are re-exported here.

pub mod config;
pub mod edit;
pub mod editor;
pub mod error;
pub mod fields;
pub mod node;
pub mod path_cache;
pub mod previews;
pub mod remap;
pub mod shortcut;
pub mod store;
pub mod tabs;

pub use json_editor_pointer as pointer;
pub use json_editor_pointer::{format_path, parse_path, Path, PathStep};
pub use json_editor_schema as schema;
pub use json_editor_schema::Schema;

pub use config::JsonEditorConfig;
pub use edit::{
    AnchorScope, CopyScope, Direction, EditOutcome, FocusTarget, PendingEdit, RowAnchor,
    StructuralEditEngine,
};
pub use editor::{JsonEditor, KeyOutcome};
pub use error::{EditError, EditorError, StoreError};
pub use fields::{filter_by_prefix, keys_by_type, missing_keys, table_columns, KeysByType};
pub use node::{Document, Node};
pub use path_cache::PathCache;
pub use previews::{extract_previews, Preview, PreviewConfig, PreviewError, UrlPath};
pub use remap::{remap_all, PathRemap};
pub use shortcut::{
    Chord, ChordError, Dispatch, EditorAction, FocusResolver, Key, KeyEvent, Keymap, MatchState,
    Modifiers, Platform, ShortcutDispatcher, ShortcutOverride, DEFAULT_CHORD_TIMEOUT_MS,
};
pub use store::{ChangeEvent, Commit, DocumentStore, ListenerId, Mutation, WeakStore};
pub use tabs::{group_document, TabConfig, TabGrouping, TabsConfig, TabsError, IMPLICIT_TAB_NAME};
