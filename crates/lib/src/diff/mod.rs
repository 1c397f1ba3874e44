//! Diff building and destroyed-subtree marking.
//!
//! [`build_diff`] compares a record's previously captured tree with its live state and
//! keeps only what changed. Every emitted child diff carries the child's `_id`. Unchanged
//! nested-many children become order-only items, but only when some sibling changed or
//! the survivors changed order; a list where nothing changed is left out entirely.
//! Removed children are appended after the live ones as destroyed subtrees.
//!
//! [`mark_destroyed`] expands a captured tree into a destroyed subtree with every
//! descendant flagged as well.

pub mod errors;

use std::collections::BTreeSet;

pub use errors::DiffError;

use crate::{
    Result,
    constants::ID_KEY,
    record::{Record, item_id, live_many, live_one, live_scalar},
    schema::{AttrKind, Catalog, Relation},
    value::{AttrPath, Scalar, Tree, Value},
};

/// Builds the sparse diff between `before` (a full captured tree, empty for a new record)
/// and the live `record`.
pub fn build_diff(catalog: &Catalog, before: &Tree, record: &dyn Record) -> Result<Tree> {
    let diff = diff_record(catalog, before, record, None, &AttrPath::root())?;
    tracing::trace!(
        model = record.model(),
        attributes = diff.len(),
        "Built diff"
    );
    Ok(diff)
}

/// Marks a full captured tree of `model` as destroyed, recursively.
///
/// Ignored attributes are dropped; everything else is kept so that the result is fully
/// expanded below the marker.
pub fn mark_destroyed(catalog: &Catalog, model: &str, tree: &Tree) -> Result<Tree> {
    destroy(catalog, model, tree, &AttrPath::root())
}

/// Checks the structural rules every stored diff must satisfy.
///
/// Nested-many items need a unique `_id` within their list, and nothing below a destroyed
/// subtree may be live.
pub fn validate_diff(tree: &Tree) -> std::result::Result<(), DiffError> {
    validate(tree, &AttrPath::root())
}

fn diff_record(
    catalog: &Catalog,
    before: &Tree,
    record: &dyn Record,
    skip: Option<&str>,
    path: &AttrPath,
) -> Result<Tree> {
    let layout = catalog.layout(record.model())?;
    let mut diff = Tree::new();

    for (name, kind) in layout.attributes() {
        if skip == Some(name) {
            continue;
        }
        let attr_path = path.attr(name);
        match kind {
            AttrKind::Scalar => {
                let current = live_scalar(&layout, record, name, &attr_path)?;
                let prior = before.scalar(name).unwrap_or(&Scalar::Null);
                if &current != prior {
                    diff.insert(name, current);
                }
            }
            AttrKind::One(relation) => {
                let prior = before.get(name).and_then(Value::as_one);
                match live_one(&layout, record, name, &attr_path)? {
                    Some(child) => {
                        let empty = Tree::new();
                        let prior = prior.unwrap_or(&empty);
                        if let Some(child_diff) =
                            diff_child(catalog, prior, child, relation, &attr_path)?
                        {
                            diff.insert(name, child_diff);
                        }
                    }
                    None => {
                        if let Some(prior) = prior {
                            diff.insert(name, destroy(catalog, &relation.target, prior, &attr_path)?);
                        }
                    }
                }
            }
            AttrKind::Many(relation) => {
                let prior = before.get(name).and_then(Value::as_many).unwrap_or(&[]);
                let children = live_many(&layout, record, name, &attr_path)?;
                if let Some(items) = diff_many(catalog, prior, children, relation, &attr_path)? {
                    diff.insert(name, Value::Many(items));
                }
            }
        }
    }
    Ok(diff)
}

/// Diff of one child against its prior tree, `_id` included; `None` when unchanged.
fn diff_child(
    catalog: &Catalog,
    prior: &Tree,
    child: &dyn Record,
    relation: &Relation,
    path: &AttrPath,
) -> Result<Option<Tree>> {
    let id = item_id(child, path)?;
    let mut diff = diff_record(catalog, prior, child, relation.stripped_key(), path)?;
    if diff.is_empty() && prior.id() == Some(&id) {
        return Ok(None);
    }
    diff.insert(ID_KEY, id);
    Ok(Some(diff))
}

fn diff_many(
    catalog: &Catalog,
    prior: &[Tree],
    children: Vec<&dyn Record>,
    relation: &Relation,
    path: &AttrPath,
) -> Result<Option<Vec<Tree>>> {
    let mut claimed = vec![false; prior.len()];
    let mut last_position = None;
    let mut seen = BTreeSet::new();
    let mut changed = false;
    let mut items = Vec::with_capacity(children.len());

    for child in children {
        let id = item_id(child, path)?;
        if !seen.insert(id.to_string()) {
            return Err(DiffError::DuplicateItemId {
                path: path.to_string(),
                id: id.to_string(),
            }
            .into());
        }

        let position = prior.iter().position(|item| item.id() == Some(&id));
        if let Some(position) = position {
            claimed[position] = true;
            // Survivors moving relative to each other is a change on its own.
            if last_position.is_some_and(|last| position < last) {
                changed = true;
            }
            last_position = Some(position);
        }

        let empty = Tree::new();
        let prior_item = position.map_or(&empty, |position| &prior[position]);
        match diff_child(catalog, prior_item, child, relation, &path.item(&id))? {
            Some(item_diff) => {
                changed = true;
                items.push(item_diff);
            }
            None => items.push(Tree::order_only(id)),
        }
    }

    for (removed, _) in prior.iter().zip(claimed).filter(|(_, claimed)| !claimed) {
        let Some(id) = removed.id() else {
            return Err(DiffError::MissingItemId {
                path: path.to_string(),
            }
            .into());
        };
        changed = true;
        items.push(destroy(catalog, &relation.target, removed, &path.item(id))?);
    }

    Ok(changed.then_some(items))
}

fn destroy(catalog: &Catalog, model: &str, tree: &Tree, path: &AttrPath) -> Result<Tree> {
    let layout = catalog.layout(model)?;
    let mut out = Tree::new().into_destroyed();

    for (name, value) in tree.iter() {
        if layout.is_ignored(name) || matches!(value, Value::Scalar(Scalar::Null)) {
            continue;
        }
        let attr_path = path.attr(name.as_str());
        let marked = match (layout.classify_value(name, &attr_path, value)?, value) {
            (AttrKind::One(relation), Value::One(child)) => {
                Value::One(destroy(catalog, &relation.target, child, &attr_path)?)
            }
            (AttrKind::Many(relation), Value::Many(items)) => {
                let mut marked = Vec::with_capacity(items.len());
                for item in items {
                    let Some(id) = item.id() else {
                        return Err(DiffError::MissingItemId {
                            path: attr_path.to_string(),
                        }
                        .into());
                    };
                    marked.push(destroy(catalog, &relation.target, item, &attr_path.item(id))?);
                }
                Value::Many(marked)
            }
            (_, other) => other.clone(),
        };
        out.insert(name.clone(), marked);
    }
    Ok(out)
}

fn validate(tree: &Tree, path: &AttrPath) -> std::result::Result<(), DiffError> {
    for (name, value) in tree.iter() {
        let attr_path = path.attr(name.as_str());
        match value {
            Value::Scalar(_) => {}
            Value::One(child) => validate_child(tree, child, &attr_path)?,
            Value::Many(items) => {
                let mut seen = BTreeSet::new();
                for item in items {
                    let Some(id) = item.id() else {
                        return Err(DiffError::MissingItemId {
                            path: attr_path.to_string(),
                        });
                    };
                    if !seen.insert(id.to_string()) {
                        return Err(DiffError::DuplicateItemId {
                            path: attr_path.to_string(),
                            id: id.to_string(),
                        });
                    }
                    validate_child(tree, item, &attr_path.item(id))?;
                }
            }
        }
    }
    Ok(())
}

fn validate_child(parent: &Tree, child: &Tree, path: &AttrPath) -> std::result::Result<(), DiffError> {
    if parent.is_destroyed() && !child.is_destroyed() {
        return Err(DiffError::ConflictingMarkers {
            path: path.to_string(),
        });
    }
    validate(child, path)
}
