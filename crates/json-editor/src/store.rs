//! The single writer of the document.
//!
//! Views read the current root and subscribe to change events; edits go
//! through [`DocumentStore::apply`], which commits a batch of mutations
//! atomically and notifies every subscriber exactly once per accepted
//! commit. Mutations issued from inside a notification are queued and run
//! after the current round has reached every subscriber.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::{Rc, Weak};

use json_editor_pointer::{format_path, split_last, Path, PathStep};
use serde_json::Value;

use crate::error::StoreError;
use crate::node::{Document, Node};
use crate::remap::PathRemap;

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Number of structural revisions kept for [`DocumentStore::resolve`].
const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub revision: u64,
    pub before: Document,
    pub after: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Set { path: Path, value: Node },
    Remove { path: Path },
    Insert { path: Path, value: Node },
    Swap { array: Path, a: usize, b: usize },
    Replace(Document),
}

impl Mutation {
    /// Applies the mutation to a working copy and reports how it moved
    /// existing paths, if at all.
    pub fn apply_to(&self, doc: &mut Node) -> Result<Option<PathRemap>, StoreError> {
        match self {
            Mutation::Set { path, value } => {
                let appended = match split_last(path) {
                    Ok((parent, leaf)) => match doc.get(parent) {
                        Some(Node::Array(items)) if leaf.as_index() == Some(items.len()) => {
                            Some(PathRemap::Inserted {
                                array: parent.to_vec(),
                                index: items.len(),
                            })
                        }
                        _ => None,
                    },
                    Err(_) => None,
                };
                doc.set_in(path, value.clone())?;
                Ok(appended)
            }
            Mutation::Remove { path } => {
                let (parent, leaf) = split_last(path).map_err(|_| StoreError::RootRemoval)?;
                let remap = match doc.get(parent) {
                    Some(Node::Array(_)) => leaf.as_index().map(|index| PathRemap::Removed {
                        array: parent.to_vec(),
                        index,
                    }),
                    _ => Some(PathRemap::KeyRemoved {
                        object: parent.to_vec(),
                        key: leaf.to_key(),
                    }),
                };
                doc.remove_in(path)?;
                Ok(remap)
            }
            Mutation::Insert { path, value } => {
                doc.insert_in(path, value.clone())?;
                let (parent, leaf) = split_last(path).map_err(|_| StoreError::RootRemoval)?;
                Ok(leaf.as_index().map(|index| PathRemap::Inserted {
                    array: parent.to_vec(),
                    index,
                }))
            }
            Mutation::Swap { array, a, b } => {
                doc.swap(array, *a, *b)?;
                Ok((a != b).then(|| PathRemap::Swapped {
                    array: array.clone(),
                    a: *a,
                    b: *b,
                }))
            }
            Mutation::Replace(next) => {
                *doc = next.clone();
                Ok(None)
            }
        }
    }
}

/// Result of a successful [`DocumentStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// A new root was published to subscribers.
    Applied {
        revision: u64,
        document: Document,
        remaps: Vec<PathRemap>,
    },
    /// The batch produced a document equal to the current one.
    Unchanged,
    /// Issued during a notification round; queued behind it.
    Deferred,
}

impl Commit {
    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied { .. })
    }

    pub fn remaps(&self) -> &[PathRemap] {
        match self {
            Commit::Applied { remaps, .. } => remaps,
            _ => &[],
        }
    }
}

struct StoreState {
    current: Document,
    revision: u64,
    emitting: bool,
    queue: VecDeque<Vec<Mutation>>,
    history: VecDeque<(u64, Vec<PathRemap>)>,
    /// Oldest revision `resolve` can still start from.
    history_floor: u64,
    next_listener_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
    /// Listeners taken out for the running notification round.
    in_flight: BTreeSet<ListenerId>,
}

/// Handle to the document store. Clones share the same document.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Rc<RefCell<StoreState>>,
}

/// Non-owning handle, for subscribers that need to call back into the store
/// without keeping it alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<RefCell<StoreState>>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<DocumentStore> {
        self.inner.upgrade().map(|inner| DocumentStore { inner })
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("DocumentStore")
            .field("revision", &state.revision)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreState {
                current: document,
                revision: 0,
                emitting: false,
                queue: VecDeque::new(),
                history: VecDeque::new(),
                history_floor: 0,
                next_listener_id: 1,
                listeners: BTreeMap::new(),
                in_flight: BTreeSet::new(),
            })),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        Self::new(Node::from(value))
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The current root. Cheap: the tree is shared, not copied.
    pub fn current(&self) -> Document {
        self.inner.borrow().current.clone()
    }

    pub fn to_json(&self) -> Value {
        self.inner.borrow().current.to_value()
    }

    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn get(&self, path: &[PathStep]) -> Option<Node> {
        self.inner.borrow().current.get(path).cloned()
    }

    pub fn set_in(&self, path: Path, value: Node) -> Result<Commit, StoreError> {
        self.apply(vec![Mutation::Set { path, value }])
    }

    pub fn remove_in(&self, path: Path) -> Result<Commit, StoreError> {
        self.apply(vec![Mutation::Remove { path }])
    }

    pub fn insert_in(&self, path: Path, value: Node) -> Result<Commit, StoreError> {
        self.apply(vec![Mutation::Insert { path, value }])
    }

    pub fn replace(&self, document: Document) -> Result<Commit, StoreError> {
        self.apply(vec![Mutation::Replace(document)])
    }

    /// Commits `batch` atomically.
    ///
    /// Every mutation is applied to a working copy in order; the first
    /// failure discards the copy and nothing is emitted. A batch whose result
    /// equals the current document is reported as [`Commit::Unchanged`].
    pub fn apply(&self, batch: Vec<Mutation>) -> Result<Commit, StoreError> {
        {
            let mut state = self.inner.borrow_mut();
            if state.emitting {
                tracing::debug!(len = batch.len(), "mutation issued during emit, deferring");
                state.queue.push_back(batch);
                return Ok(Commit::Deferred);
            }
        }
        let commit = self.commit(batch);
        self.drain_queue();
        commit
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let mut state = self.inner.borrow_mut();
        let id = state.next_listener_id;
        state.next_listener_id = state.next_listener_id.saturating_add(1);
        state.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn off_change(&self, listener_id: ListenerId) -> bool {
        let mut state = self.inner.borrow_mut();
        state.listeners.remove(&listener_id).is_some() || state.in_flight.remove(&listener_id)
    }

    /// Carries a path captured at `since_revision` forward to the current
    /// revision. `None` when the addressed row or key was removed since, or
    /// when `since_revision` is older than the retained history.
    pub fn resolve(&self, path: &[PathStep], since_revision: u64) -> Option<Path> {
        let state = self.inner.borrow();
        if since_revision < state.history_floor {
            tracing::warn!(
                path = %format_path(path),
                since_revision,
                floor = state.history_floor,
                "path older than remap history"
            );
            return None;
        }
        state
            .history
            .iter()
            .filter(|(revision, _)| *revision > since_revision)
            .flat_map(|(_, remaps)| remaps.iter())
            .try_fold(path.to_vec(), |current, remap| remap.apply(&current))
    }

    fn commit(&self, batch: Vec<Mutation>) -> Result<Commit, StoreError> {
        let (event, remaps) = {
            let mut state = self.inner.borrow_mut();
            let before = state.current.clone();
            let mut working = before.clone();
            let mut remaps = Vec::new();
            for mutation in &batch {
                if let Some(remap) = mutation.apply_to(&mut working)? {
                    remaps.push(remap);
                }
            }
            if working == before {
                tracing::debug!("batch left the document unchanged");
                return Ok(Commit::Unchanged);
            }
            state.revision += 1;
            let revision = state.revision;
            if !remaps.is_empty() {
                state.history.push_back((revision, remaps.clone()));
                while state.history.len() > HISTORY_LIMIT {
                    if let Some((dropped, _)) = state.history.pop_front() {
                        state.history_floor = dropped;
                    }
                }
            }
            state.current = working.clone();
            (
                ChangeEvent {
                    revision,
                    before,
                    after: working,
                },
                remaps,
            )
        };
        self.emit(&event);
        Ok(Commit::Applied {
            revision: event.revision,
            document: event.after,
            remaps,
        })
    }

    fn emit(&self, event: &ChangeEvent) {
        let mut listeners = {
            let mut state = self.inner.borrow_mut();
            state.emitting = true;
            let listeners = std::mem::take(&mut state.listeners);
            state.in_flight = listeners.keys().copied().collect();
            listeners
        };
        for (id, listener) in listeners.iter_mut() {
            if !self.inner.borrow().in_flight.contains(id) {
                continue;
            }
            listener(event);
        }
        let mut state = self.inner.borrow_mut();
        let in_flight = std::mem::take(&mut state.in_flight);
        listeners.retain(|id, _| in_flight.contains(id));
        let added = std::mem::take(&mut state.listeners);
        listeners.extend(added);
        state.listeners = listeners;
        state.emitting = false;
    }

    fn drain_queue(&self) {
        loop {
            let next = self.inner.borrow_mut().queue.pop_front();
            let Some(batch) = next else {
                break;
            };
            if let Err(err) = self.commit(batch) {
                tracing::warn!(error = %err, "deferred mutation rejected");
            }
        }
    }
}
