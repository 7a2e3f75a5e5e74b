//! Structural edits on array rows and object fields.
//!
//! Row operations are anchored on the focused path: the array element that
//! contains the focused field is the row being inserted after, copied,
//! moved or deleted. Rows get no stable identity; they are addressed by
//! position, so a pending field edit is always re-resolved against the
//! current revision before it is written.

use std::rc::Rc;

use json_editor_pointer::{format_path, Path, PathStep};
use json_editor_schema::{empty_value, empty_value_like, empty_value_or_default, Schema};
use serde_json::Value;

use crate::error::EditError;
use crate::node::{Document, Node};
use crate::remap::PathRemap;
use crate::store::{Commit, DocumentStore, Mutation};

/// Which enclosing row a path anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorScope {
    /// The innermost array element on the path.
    Nearest,
    /// The outermost array element on the path.
    Root,
}

/// What a copied row keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyScope {
    /// Everything except the focused field, which is reset to its empty value.
    Field,
    /// The whole row.
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A row located inside the document plus the focused path relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAnchor {
    pub array: Path,
    pub index: usize,
    pub field: Path,
}

impl RowAnchor {
    pub fn resolve(focused: &[PathStep], scope: AnchorScope) -> Option<RowAnchor> {
        let mut positions = focused
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_index())
            .map(|(pos, _)| pos);
        let pos = match scope {
            AnchorScope::Nearest => positions.last(),
            AnchorScope::Root => positions.next(),
        }?;
        Some(RowAnchor {
            array: focused[..pos].to_vec(),
            index: focused[pos].as_index()?,
            field: focused[pos + 1..].to_vec(),
        })
    }

    pub fn row_path(&self) -> Path {
        self.row_path_at(self.index)
    }

    pub fn row_path_at(&self, index: usize) -> Path {
        let mut path = self.array.clone();
        path.push(PathStep::Index(index));
        path
    }

    /// Path of the same field inside the row at `index`.
    pub fn field_path_at(&self, index: usize) -> Path {
        let mut path = self.row_path_at(index);
        path.extend(self.field.iter().cloned());
        path
    }
}

/// Where the view should put focus after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    Field(Path),
    None,
}

/// A field value typed by the user and not yet committed, with the
/// revision its path was captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub path: Path,
    pub value: Value,
    pub revision: u64,
}

impl PendingEdit {
    pub fn new(path: Path, value: Value, revision: u64) -> Self {
        Self {
            path,
            value,
            revision,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub commit: Commit,
    pub focus: FocusTarget,
    pub remap: Vec<PathRemap>,
}

impl EditOutcome {
    fn new(commit: Commit, focus: FocusTarget) -> Self {
        let remap = commit.remaps().to_vec();
        Self {
            commit,
            focus,
            remap,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructuralEditEngine {
    store: DocumentStore,
    schema: Rc<Schema>,
}

impl StructuralEditEngine {
    pub fn new(store: DocumentStore, schema: Rc<Schema>) -> Self {
        Self { store, schema }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Inserts an empty row after the anchored row.
    pub fn insert_row(
        &self,
        focused: &[PathStep],
        scope: AnchorScope,
        pending: Option<&PendingEdit>,
    ) -> Result<EditOutcome, EditError> {
        let anchor = self.anchor(focused, scope)?;
        let items = self.items_schema(&anchor)?;
        let (doc, mut batch) = self.prepare(pending)?;
        let row = match (items, doc.get(&anchor.row_path())) {
            (Some(items), Some(template)) => empty_value_like(items, &template.to_value()),
            (Some(items), None) => empty_value(items),
            (None, _) => empty_value_or_default(None),
        };
        let row = Node::from(row);
        let new_row = anchor.row_path_at(anchor.index + 1);
        let focus = first_field(&new_row, &row);
        batch.push(Mutation::Insert {
            path: new_row,
            value: row,
        });
        self.commit(batch, focus)
    }

    /// Inserts a copy of the anchored row after it.
    pub fn copy_row(
        &self,
        focused: &[PathStep],
        anchor_scope: AnchorScope,
        copy_scope: CopyScope,
        pending: Option<&PendingEdit>,
    ) -> Result<EditOutcome, EditError> {
        let anchor = self.anchor(focused, anchor_scope)?;
        let items = self.items_schema(&anchor)?;
        let (doc, mut batch) = self.prepare(pending)?;
        let row_path = anchor.row_path();
        let mut row = doc
            .get(&row_path)
            .cloned()
            .ok_or_else(|| EditError::NotARow(format_path(&row_path)))?;
        if copy_scope == CopyScope::Field {
            let empty = match (items, anchor.field.is_empty()) {
                (Some(items), true) => empty_value(items),
                (Some(items), false) => empty_value_or_default(items.sub_schema(&anchor.field)),
                (None, _) => empty_value_or_default(None),
            };
            row.set_in(&anchor.field, Node::from(empty))?;
        }
        let target = anchor.index + 1;
        batch.push(Mutation::Insert {
            path: anchor.row_path_at(target),
            value: row,
        });
        self.commit(batch, FocusTarget::Field(anchor.field_path_at(target)))
    }

    /// Exchanges the anchored row with its neighbour. Focus follows the row.
    pub fn move_row(
        &self,
        focused: &[PathStep],
        direction: Direction,
        pending: Option<&PendingEdit>,
    ) -> Result<EditOutcome, EditError> {
        let anchor = self.anchor(focused, AnchorScope::Nearest)?;
        self.items_schema(&anchor)?;
        let (doc, mut batch) = self.prepare(pending)?;
        let len = row_count(&doc, &anchor)?;
        let target = match direction {
            Direction::Up => anchor.index.checked_sub(1),
            Direction::Down => Some(anchor.index + 1).filter(|&next| next < len),
        };
        let Some(target) = target else {
            tracing::debug!(
                path = %format_path(focused),
                ?direction,
                "row already at boundary"
            );
            let commit = if batch.is_empty() {
                Commit::Unchanged
            } else {
                self.store.apply(batch)?
            };
            return Ok(EditOutcome::new(commit, FocusTarget::Field(focused.to_vec())));
        };
        batch.push(Mutation::Swap {
            array: anchor.array.clone(),
            a: anchor.index,
            b: target,
        });
        self.commit(batch, FocusTarget::Field(anchor.field_path_at(target)))
    }

    /// Removes the anchored row. Focus moves to the row that took its place,
    /// else to the new last row.
    pub fn delete_row(
        &self,
        focused: &[PathStep],
        pending: Option<&PendingEdit>,
    ) -> Result<EditOutcome, EditError> {
        let anchor = self.anchor(focused, AnchorScope::Nearest)?;
        self.items_schema(&anchor)?;
        let (mut doc, mut batch) = self.prepare(pending)?;
        row_count(&doc, &anchor)?;
        let removal = Mutation::Remove {
            path: anchor.row_path(),
        };
        removal.apply_to(&mut doc)?;
        batch.push(removal);
        let remaining = doc
            .get(&anchor.array)
            .and_then(Node::as_array)
            .map_or(0, <[Node]>::len);
        let focus = match remaining {
            0 => FocusTarget::None,
            n => {
                let row_path = anchor.row_path_at(anchor.index.min(n - 1));
                match doc.get(&row_path) {
                    Some(row) => first_field(&row_path, row),
                    None => FocusTarget::Field(row_path),
                }
            }
        };
        self.commit(batch, focus)
    }

    pub fn set_field(&self, path: Path, value: Value) -> Result<EditOutcome, EditError> {
        let focus = FocusTarget::Field(path.clone());
        let commit = self.store.set_in(path, Node::from(value))?;
        Ok(EditOutcome::new(commit, focus))
    }

    pub fn remove_field(&self, path: Path) -> Result<EditOutcome, EditError> {
        let commit = self.store.remove_in(path)?;
        Ok(EditOutcome::new(commit, FocusTarget::None))
    }

    /// Adds `key` to the object at `object` with the schema's empty value.
    pub fn add_field(&self, object: &[PathStep], key: &str) -> Result<EditOutcome, EditError> {
        let mut path = object.to_vec();
        path.push(PathStep::Key(key.to_owned()));
        let value = empty_value_or_default(self.schema.sub_schema(&path));
        self.set_field(path, value)
    }

    /// Writes a pending edit (commit on blur) at its current coordinates.
    pub fn commit_field(&self, edit: &PendingEdit) -> Result<EditOutcome, EditError> {
        let path = self.resolve_pending(edit)?;
        self.set_field(path, edit.value.clone())
    }

    fn anchor(&self, focused: &[PathStep], scope: AnchorScope) -> Result<RowAnchor, EditError> {
        RowAnchor::resolve(focused, scope).ok_or_else(|| {
            let path = format_path(focused);
            tracing::warn!(%path, "no enclosing row");
            EditError::NotARow(path)
        })
    }

    /// Item schema of the anchored array. `Ok(None)` when the schema does not
    /// describe the location at all.
    fn items_schema(&self, anchor: &RowAnchor) -> Result<Option<&Schema>, EditError> {
        match self.schema.sub_schema(&anchor.array) {
            Some(Schema::Array(array)) => Ok(array.items.as_deref()),
            Some(other) => {
                let path = format_path(&anchor.array);
                tracing::warn!(%path, kind = other.kind(), "row operation on non-array schema");
                Err(EditError::NotAnArraySchema(path))
            }
            None => {
                tracing::warn!(path = %format_path(&anchor.array), "schema lookup failed");
                Ok(None)
            }
        }
    }

    fn resolve_pending(&self, edit: &PendingEdit) -> Result<Path, EditError> {
        self.store
            .resolve(&edit.path, edit.revision)
            .ok_or_else(|| {
                let path = format_path(&edit.path);
                tracing::warn!(%path, revision = edit.revision, "dropping stale edit");
                EditError::StaleEdit(path)
            })
    }

    /// Current document with the pending edit applied, plus the batch that
    /// applies it.
    fn prepare(&self, pending: Option<&PendingEdit>) -> Result<(Document, Vec<Mutation>), EditError> {
        let mut doc = self.store.current();
        let mut batch = Vec::new();
        if let Some(edit) = pending {
            match self.resolve_pending(edit) {
                Ok(path) => {
                    let mutation = Mutation::Set {
                        path,
                        value: Node::from(&edit.value),
                    };
                    mutation.apply_to(&mut doc)?;
                    batch.push(mutation);
                }
                Err(EditError::StaleEdit(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok((doc, batch))
    }

    fn commit(&self, batch: Vec<Mutation>, focus: FocusTarget) -> Result<EditOutcome, EditError> {
        let commit = self.store.apply(batch)?;
        Ok(EditOutcome::new(commit, focus))
    }
}

fn row_count(doc: &Document, anchor: &RowAnchor) -> Result<usize, EditError> {
    let len = doc
        .get(&anchor.array)
        .and_then(Node::as_array)
        .map(<[Node]>::len)
        .ok_or_else(|| EditError::NotARow(format_path(&anchor.row_path())))?;
    if anchor.index >= len {
        return Err(EditError::NotARow(format_path(&anchor.row_path())));
    }
    Ok(len)
}

fn first_field(row_path: &[PathStep], row: &Node) -> FocusTarget {
    let mut path = row_path.to_vec();
    if let Some(key) = row.as_object().and_then(|map| map.keys().next()) {
        path.push(PathStep::Key(key.clone()));
    }
    FocusTarget::Field(path)
}
