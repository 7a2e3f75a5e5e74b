use std::collections::HashMap;

use json_editor_pointer::{Path, PathStep};

use crate::remap::PathRemap;

/// Memo from a local step (field key or row index) to the full path of that
/// child, owned by one rendering node.
///
/// Entries touched by a structural change of the owning container are
/// discarded, never rewritten: the next lookup rebuilds them from the
/// current base path. The host keeps one cache per rendered container and
/// passes every [`PathRemap`] of an `EditOutcome` to [`PathCache::invalidate`].
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    base: Path,
    entries: HashMap<PathStep, Path>,
}

impl PathCache {
    pub fn new(base: Path) -> Self {
        Self {
            base,
            entries: HashMap::new(),
        }
    }

    pub fn base(&self) -> &[PathStep] {
        &self.base
    }

    pub fn path_for(&mut self, step: &PathStep) -> &Path {
        let base = &self.base;
        self.entries.entry(step.clone()).or_insert_with(|| {
            let mut path = base.clone();
            path.push(step.clone());
            path
        })
    }

    /// Moves the cache to a new base path; every entry is dropped.
    pub fn rebase(&mut self, base: Path) {
        if base != self.base {
            self.base = base;
            self.entries.clear();
        }
    }

    /// Drops the entries a structural change may have made wrong.
    pub fn invalidate(&mut self, remap: &PathRemap) {
        let container = remap.container();
        if self.base.len() > container.len() && self.base.starts_with(container) {
            // The owning row itself may have moved.
            if remap.apply(&self.base).as_deref() != Some(self.base.as_slice()) {
                self.entries.clear();
            }
            return;
        }
        if self.base.as_slice() != container {
            return;
        }
        self.entries
            .retain(|_, path| remap.apply(path).as_deref() == Some(path.as_slice()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
