//! Resolved before/after pairs.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Map;

use crate::{
    constants::{DESTROYED_FLAG, ID_KEY},
    value::Scalar,
};

/// The resolved change of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Change {
    /// A scalar's value before and after the write.
    Scalar {
        /// Value just before the write; `Null` when never set
        before: Scalar,
        /// Value written
        after: Scalar,
    },
    /// Changes inside a nested-one child.
    One(ChangeSet),
    /// Per-item results for a nested-many list, live items first.
    Many(Vec<ItemChange>),
}

/// The resolved change of one nested-many item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ItemChange {
    /// The item exists after the write; only modified attributes plus the `_id` pair.
    Present(ChangeSet),
    /// The item was removed by the write; carries its full prior value.
    Removed(ChangeSet),
}

impl ItemChange {
    /// The item's change-set.
    pub fn changes(&self) -> &ChangeSet {
        match self {
            ItemChange::Present(changes) | ItemChange::Removed(changes) => changes,
        }
    }

    /// True for a removed item.
    pub fn is_removed(&self) -> bool {
        matches!(self, ItemChange::Removed(_))
    }
}

/// Attribute name to resolved [`Change`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, Change>);

impl ChangeSet {
    /// Creates an empty change-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The change-set of an item that kept its place without changing.
    pub fn unchanged_item(id: &Scalar) -> Self {
        let mut set = Self::new();
        set.insert(
            ID_KEY,
            Change::Scalar {
                before: id.clone(),
                after: id.clone(),
            },
        );
        set
    }

    /// Records the change of one attribute.
    pub fn insert(&mut self, name: impl Into<String>, change: Change) {
        self.0.insert(name.into(), change);
    }

    /// The change of one attribute.
    pub fn get(&self, name: &str) -> Option<&Change> {
        self.0.get(name)
    }

    /// True when the attribute is resolved.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of resolved attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates changes in attribute-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.0.iter()
    }

    /// The `(before, after)` pair of a scalar attribute.
    pub fn scalar(&self, name: &str) -> Option<(&Scalar, &Scalar)> {
        match self.0.get(name) {
            Some(Change::Scalar { before, after }) => Some((before, after)),
            _ => None,
        }
    }

    /// The nested change-set of a nested-one attribute.
    pub fn one(&self, name: &str) -> Option<&ChangeSet> {
        match self.0.get(name) {
            Some(Change::One(set)) => Some(set),
            _ => None,
        }
    }

    /// The item results of a nested-many attribute.
    pub fn many(&self, name: &str) -> Option<&[ItemChange]> {
        match self.0.get(name) {
            Some(Change::Many(items)) => Some(items),
            _ => None,
        }
    }

    /// The child id before the write, when the child existed.
    pub fn before_id(&self) -> Option<&Scalar> {
        self.scalar(ID_KEY)
            .map(|(before, _)| before)
            .filter(|id| !id.is_null())
    }

    /// The child id after the write, when the child still exists.
    pub fn after_id(&self) -> Option<&Scalar> {
        self.scalar(ID_KEY)
            .map(|(_, after)| after)
            .filter(|id| !id.is_null())
    }

    /// Plain JSON rendering: scalars become `[before, after]`, removed items carry
    /// `$destroyed: true`.
    pub fn to_json(&self) -> Scalar {
        let map: Map<String, Scalar> = self
            .0
            .iter()
            .map(|(name, change)| {
                let value = match change {
                    Change::Scalar { before, after } => {
                        Scalar::Array(vec![before.clone(), after.clone()])
                    }
                    Change::One(set) => set.to_json(),
                    Change::Many(items) => Scalar::Array(
                        items
                            .iter()
                            .map(|item| {
                                let mut json = item.changes().to_json();
                                if item.is_removed()
                                    && let Scalar::Object(map) = &mut json
                                {
                                    map.insert(DESTROYED_FLAG.to_string(), Scalar::Bool(true));
                                }
                                json
                            })
                            .collect(),
                    ),
                };
                (name.clone(), value)
            })
            .collect();
        Scalar::Object(map)
    }
}
