//! Persistent document tree.
//!
//! Containers are reference counted and copied on write, so a mutation clones
//! only the spine from the root to the edited node. Every other subtree is
//! shared with the previous root, which stays valid and unchanged.

use std::sync::Arc;

use indexmap::IndexMap;
use json_editor_pointer::{format_path, split_last, PathStep};
use serde_json::{Map, Number, Value};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Vec<Node>>),
    Object(Arc<IndexMap<String, Node>>),
}

/// A document is the root node of the tree.
pub type Document = Node;

impl Default for Node {
    fn default() -> Self {
        Node::Object(Arc::new(IndexMap::new()))
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(Arc::from(s.as_str())),
            Value::Array(items) => Node::Array(Arc::new(items.iter().map(Node::from).collect())),
            Value::Object(map) => Node::Object(Arc::new(
                map.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect(),
            )),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from(&value)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        node.to_value()
    }
}

impl Node {
    pub fn to_value(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.to_string()),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Node::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// True when both nodes are the same allocation (or equal scalars).
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Array(a), Node::Array(b)) => Arc::ptr_eq(a, b),
            (Node::Object(a), Node::Object(b)) => Arc::ptr_eq(a, b),
            (Node::String(a), Node::String(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => self == other,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Object(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Follows a single step. An index step into an object matches the
    /// decimal key; a numeric key step into an array matches the index.
    pub fn step(&self, step: &PathStep) -> Option<&Node> {
        match self {
            Node::Array(items) => items.get(step.as_index()?),
            Node::Object(map) => match step {
                PathStep::Key(key) => map.get(key.as_str()),
                PathStep::Index(idx) => map.get(idx.to_string().as_str()),
            },
            _ => None,
        }
    }

    /// Looks up the node at `path`; `None` past the end of an array or
    /// through a scalar.
    pub fn get(&self, path: &[PathStep]) -> Option<&Node> {
        let mut cur = self;
        for step in path {
            cur = cur.step(step)?;
        }
        Some(cur)
    }

    /// Replaces the node at `path`. The parent must exist; an array index
    /// equal to the length appends.
    pub fn set_in(&mut self, path: &[PathStep], value: Node) -> Result<(), StoreError> {
        let Ok((parent_path, leaf)) = split_last(path) else {
            *self = value;
            return Ok(());
        };
        match descend_mut(self, parent_path)? {
            Node::Object(map) => {
                Arc::make_mut(map).insert(leaf.to_key(), value);
                Ok(())
            }
            Node::Array(items) => {
                let index = array_index(parent_path, leaf)?;
                let items = Arc::make_mut(items);
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(StoreError::IndexOutOfBounds {
                            path: format_path(parent_path),
                            index,
                            len: items.len(),
                        })
                    }
                }
                Ok(())
            }
            _ => Err(StoreError::NotAContainer(format_path(parent_path))),
        }
    }

    /// Removes the node at `path`. Array siblings shift down; the remaining
    /// keys of an object keep their order.
    pub fn remove_in(&mut self, path: &[PathStep]) -> Result<Node, StoreError> {
        let (parent_path, leaf) = split_last(path).map_err(|_| StoreError::RootRemoval)?;
        match descend_mut(self, parent_path)? {
            Node::Object(map) => Arc::make_mut(map)
                .shift_remove(leaf.to_key().as_str())
                .ok_or_else(|| StoreError::NotFound(format_path(path))),
            Node::Array(items) => {
                let index = array_index(parent_path, leaf)?;
                if index >= items.len() {
                    return Err(StoreError::NotFound(format_path(path)));
                }
                Ok(Arc::make_mut(items).remove(index))
            }
            _ => Err(StoreError::NotAContainer(format_path(parent_path))),
        }
    }

    /// Inserts into an array at `path`, shifting later elements up.
    pub fn insert_in(&mut self, path: &[PathStep], value: Node) -> Result<(), StoreError> {
        let (parent_path, leaf) =
            split_last(path).map_err(|_| StoreError::NotAnArray(String::new()))?;
        let Node::Array(items) = descend_mut(self, parent_path)? else {
            return Err(StoreError::NotAnArray(format_path(parent_path)));
        };
        let index = array_index(parent_path, leaf)?;
        if index > items.len() {
            return Err(StoreError::IndexOutOfBounds {
                path: format_path(parent_path),
                index,
                len: items.len(),
            });
        }
        Arc::make_mut(items).insert(index, value);
        Ok(())
    }

    /// Exchanges two elements of the array at `path`.
    pub fn swap(&mut self, path: &[PathStep], a: usize, b: usize) -> Result<(), StoreError> {
        let Node::Array(items) = descend_mut(self, path)? else {
            return Err(StoreError::NotAnArray(format_path(path)));
        };
        let len = items.len();
        if let Some(&index) = [a, b].iter().find(|&&i| i >= len) {
            return Err(StoreError::IndexOutOfBounds {
                path: format_path(path),
                index,
                len,
            });
        }
        if a != b {
            Arc::make_mut(items).swap(a, b);
        }
        Ok(())
    }
}

fn array_index(parent: &[PathStep], leaf: &PathStep) -> Result<usize, StoreError> {
    leaf.as_index().ok_or_else(|| StoreError::InvalidIndex {
        path: format_path(parent),
        index: leaf.to_key(),
    })
}

fn descend_mut<'a>(node: &'a mut Node, path: &[PathStep]) -> Result<&'a mut Node, StoreError> {
    let mut cur = node;
    for (depth, step) in path.iter().enumerate() {
        let missing = || StoreError::NotFound(format_path(&path[..=depth]));
        cur = match (step, cur) {
            (_, Node::Object(map)) => Arc::make_mut(map)
                .get_mut(step.to_key().as_str())
                .ok_or_else(missing)?,
            (_, Node::Array(items)) => {
                let index = step.as_index().ok_or_else(missing)?;
                Arc::make_mut(items).get_mut(index).ok_or_else(missing)?
            }
            _ => return Err(StoreError::NotAContainer(format_path(&path[..depth]))),
        };
    }
    Ok(cur)
}
