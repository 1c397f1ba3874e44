//! Value trees shared by captures, diffs and reconstruction.
//!
//! A [`Tree`] maps attribute names to a [`Value`]: a scalar, a single nested child
//! tree, or an ordered list of child trees. The same type represents both a full
//! capture of a record and the sparse diff stored in a trace; in a sparse diff an
//! omitted attribute means "unchanged at this step".
//!
//! Two markers live on the tree itself:
//! - the destroyed flag ([`Tree::is_destroyed`]), meaning the owning record or child no
//!   longer exists as of the trace holding it;
//! - an order-only item ([`Tree::is_order_only`]), a nested list item that carries only its
//!   `_id` and says "still here, same position, nothing changed".

mod json;
mod path;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use path::{AttrPath, Located, Segment};

use crate::constants::ID_KEY;

/// Scalar attribute values: strings, numbers, booleans, null, or an opaque structured blob.
///
/// Blobs are compared and stored as a single unit, never diffed internally.
pub type Scalar = serde_json::Value;

/// A value stored under one attribute of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A leaf value.
    Scalar(Scalar),
    /// A single nested child (nested-one relation).
    One(Tree),
    /// An ordered list of nested children, each carrying `_id` (nested-many relation).
    Many(Vec<Tree>),
}

impl Value {
    /// Returns the scalar if this is a leaf value.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the child tree if this is a nested-one value.
    pub fn as_one(&self) -> Option<&Tree> {
        match self {
            Value::One(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the child list if this is a nested-many value.
    pub fn as_many(&self) -> Option<&[Tree]> {
        match self {
            Value::Many(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the shape name, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::One(_) => "nested-one",
            Value::Many(_) => "nested-many",
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::from(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Scalar(Scalar::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::from(b))
    }
}

impl From<Tree> for Value {
    fn from(t: Tree) -> Self {
        Value::One(t)
    }
}

impl From<Vec<Tree>> for Value {
    fn from(items: Vec<Tree>) -> Self {
        Value::Many(items)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// An attribute tree: a full capture or a sparse diff.
///
/// Attribute names are unique per level. Nested-many items keep their write order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default, skip_serializing_if = "is_false")]
    destroyed: bool,
    #[serde(default)]
    attrs: BTreeMap<String, Value>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an order-only nested item carrying nothing but its id.
    pub fn order_only(id: impl Into<Scalar>) -> Self {
        Self::new().with(ID_KEY, Value::Scalar(id.into()))
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style destroyed flag.
    pub fn into_destroyed(mut self) -> Self {
        self.destroyed = true;
        self
    }

    /// Sets or clears the destroyed flag.
    pub fn set_destroyed(&mut self, destroyed: bool) {
        self.destroyed = destroyed;
    }

    /// True when this subtree records the removal of its owner.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True for a nested item that only preserves its position.
    pub fn is_order_only(&self) -> bool {
        !self.destroyed && self.attrs.len() == 1 && self.attrs.contains_key(ID_KEY)
    }

    /// True when the tree carries neither attributes nor the destroyed flag.
    pub fn is_empty(&self) -> bool {
        !self.destroyed && self.attrs.is_empty()
    }

    /// Number of attributes at this level.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Inserts or replaces an attribute value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attrs.insert(name.into(), value.into())
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attrs.remove(name)
    }

    /// Looks up an attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Looks up a scalar attribute.
    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        self.get(name).and_then(Value::as_scalar)
    }

    /// True when the attribute is present at this level.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The `_id` of this tree, if it carries one.
    pub fn id(&self) -> Option<&Scalar> {
        self.scalar(ID_KEY).filter(|id| !id.is_null())
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    /// Attribute names in name order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.attrs.keys()
    }

    /// Finds a nested-many item by id.
    pub fn item<'a>(items: &'a [Tree], id: &Scalar) -> Option<&'a Tree> {
        items.iter().find(|item| item.id() == Some(id))
    }
}
