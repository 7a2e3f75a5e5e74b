//! Path remapping across structural changes.
//!
//! A path is only meaningful against the revision it was captured at. Each
//! structural mutation records a [`PathRemap`] so that an older path (say, a
//! field whose commit-on-blur arrives after its row moved) can be carried
//! forward to the coordinates it addresses now.

use json_editor_pointer::{Path, PathStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRemap {
    /// A row was inserted at `index`; later siblings moved up by one.
    Inserted { array: Path, index: usize },
    /// The row at `index` was removed; later siblings moved down by one.
    Removed { array: Path, index: usize },
    /// Rows `a` and `b` exchanged positions.
    Swapped { array: Path, a: usize, b: usize },
    /// An object key was removed.
    KeyRemoved { object: Path, key: String },
}

impl PathRemap {
    /// Carries `path` across this change. `None` when the path addressed
    /// something that no longer exists.
    pub fn apply(&self, path: &[PathStep]) -> Option<Path> {
        match self {
            PathRemap::KeyRemoved { object, key } => {
                let removed = path.len() > object.len()
                    && path.starts_with(object)
                    && path[object.len()].to_key() == *key;
                (!removed).then(|| path.to_vec())
            }
            PathRemap::Inserted { array, index } => {
                remap_index(array, path, |i| Some(if i >= *index { i + 1 } else { i }))
            }
            PathRemap::Removed { array, index } => remap_index(array, path, |i| {
                match i.cmp(index) {
                    std::cmp::Ordering::Less => Some(i),
                    std::cmp::Ordering::Equal => None,
                    std::cmp::Ordering::Greater => Some(i - 1),
                }
            }),
            PathRemap::Swapped { array, a, b } => remap_index(array, path, |i| {
                Some(if i == *a {
                    *b
                } else if i == *b {
                    *a
                } else {
                    i
                })
            }),
        }
    }

    /// The array or object whose children this change affects.
    pub fn container(&self) -> &[PathStep] {
        match self {
            PathRemap::Inserted { array, .. }
            | PathRemap::Removed { array, .. }
            | PathRemap::Swapped { array, .. } => array,
            PathRemap::KeyRemoved { object, .. } => object,
        }
    }
}

/// Carries `path` through a sequence of changes, in order.
pub fn remap_all<'a, I>(path: &[PathStep], remaps: I) -> Option<Path>
where
    I: IntoIterator<Item = &'a PathRemap>,
{
    remaps
        .into_iter()
        .try_fold(path.to_vec(), |current, remap| remap.apply(&current))
}

fn remap_index(
    array: &[PathStep],
    path: &[PathStep],
    f: impl FnOnce(usize) -> Option<usize>,
) -> Option<Path> {
    if path.len() <= array.len() || !path.starts_with(array) {
        return Some(path.to_vec());
    }
    let Some(old) = path[array.len()].as_index() else {
        return Some(path.to_vec());
    };
    let new = f(old)?;
    let mut out = path.to_vec();
    out[array.len()] = PathStep::Index(new);
    Some(out)
}
