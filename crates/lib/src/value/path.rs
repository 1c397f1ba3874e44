//! Attribute paths used to navigate diff trees and to name offending attributes in errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Scalar, Tree, Value};

/// One step of an [`AttrPath`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Descend into an attribute by name.
    Attr(String),
    /// Select a nested-many item by its `_id`.
    Item(Scalar),
}

/// A path from the root of a record to a nested attribute, e.g. `tags[2].label`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPath(Vec<Segment>);

/// Outcome of following a path through a diff tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Located<'a> {
    /// The tree does not mention this path.
    Missing,
    /// The path exists but its subtree (or one above it) is destroyed or explicitly null.
    Cleared,
    /// The subtree at the path.
    Found(&'a Tree),
}

impl AttrPath {
    /// The empty path, addressing the record itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by an attribute name.
    pub fn attr(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(Segment::Attr(name.into()));
        next
    }

    /// Returns a new path extended by a nested-many item id.
    pub fn item(&self, id: &Scalar) -> Self {
        let mut next = self.clone();
        next.0.push(Segment::Item(id.clone()));
        next
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Follows this path through `tree`.
    ///
    /// Attribute segments descend through nested-one children by name; an attribute
    /// naming a nested-many list must be followed by an item segment selecting the
    /// child by id. A destroyed tree anywhere along the way yields [`Located::Cleared`].
    pub fn locate<'a>(&self, tree: &'a Tree) -> Located<'a> {
        let mut current = tree;
        let mut segments = self.0.iter();
        if current.is_destroyed() {
            return Located::Cleared;
        }
        while let Some(segment) = segments.next() {
            let Segment::Attr(name) = segment else {
                return Located::Missing;
            };
            current = match current.get(name) {
                None => return Located::Missing,
                Some(Value::Scalar(Scalar::Null)) => return Located::Cleared,
                Some(Value::Scalar(_)) => return Located::Missing,
                Some(Value::One(child)) => child,
                Some(Value::Many(items)) => {
                    let Some(Segment::Item(id)) = segments.next() else {
                        return Located::Missing;
                    };
                    match Tree::item(items, id) {
                        Some(item) => item,
                        None => return Located::Missing,
                    }
                }
            };
            if current.is_destroyed() {
                return Located::Cleared;
            }
        }
        Located::Found(current)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Attr(name) if i == 0 => write!(f, "{name}")?,
                Segment::Attr(name) => write!(f, ".{name}")?,
                Segment::Item(id) => write!(f, "[{id}]")?,
            }
        }
        Ok(())
    }
}
