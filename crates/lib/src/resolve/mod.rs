//! Change-set resolution.
//!
//! A trace stores only what changed at its step, so the value an attribute had just
//! before that step lives in whichever earlier trace last wrote it. The resolver takes the
//! attributes named in a trace's own diff and walks the chain backwards, one ancestor at
//! a time, until each of them has a `before` value.
//!
//! At every ancestor the resolver follows the same attribute path the target trace uses
//! (names for scalars and nested-one children, `_id` for nested-many items):
//!
//! - the path is absent: the ancestor did not touch this subtree, keep walking;
//! - the path is destroyed or cleared: nothing older is relevant, stop and fill;
//! - the path exists: take every still-unresolved scalar the ancestor wrote, and resolve
//!   relations one level down starting from this same ancestor.
//!
//! Filling gives scalars a `Null` before value, or for a destroyed subtree a `Null` after
//! value, since a destroyed subtree is always stored fully expanded.

mod change_set;
pub mod errors;

use std::sync::Arc;

pub use change_set::{Change, ChangeSet, ItemChange};
pub use errors::ResolveError;

use crate::{
    Result, Trace,
    schema::{AttrKind, Catalog, ModelLayout, Relation},
    store::TraceStore,
    value::{AttrPath, Located, Scalar, Tree, Value},
};

/// Resolves the full before/after change-set of `trace`.
pub fn resolve_change_set(
    catalog: &Catalog,
    store: &dyn TraceStore,
    trace: &Trace,
) -> Result<ChangeSet> {
    let resolver = Resolver {
        catalog,
        store,
        trace,
    };
    let start = resolver.previous(trace)?;
    let set = resolver.resolve(trace.target_model(), trace.diff(), &AttrPath::root(), start)?;
    tracing::debug!(
        trace_id = %trace.id(),
        model = trace.target_model(),
        attributes = set.len(),
        "Resolved change-set"
    );
    Ok(set)
}

/// One attribute of the target diff, classified against the current schema.
enum Wanted<'t> {
    Scalar(&'t Scalar),
    One(Relation, &'t Tree),
    Many(Relation, &'t [Tree]),
}

struct Resolver<'a> {
    catalog: &'a Catalog,
    store: &'a dyn TraceStore,
    trace: &'a Trace,
}

impl Resolver<'_> {
    fn previous(&self, of: &Trace) -> Result<Option<Trace>> {
        self.store.previous(of).map_err(|err| {
            ResolveError::BrokenChain {
                trace_id: self.trace.id().clone(),
                reason: format!("no previous entry for {}: {err}", of.id()),
            }
            .into()
        })
    }

    fn mismatch(&self, path: &AttrPath, reason: impl Into<String>) -> crate::Error {
        ResolveError::SchemaMismatch {
            trace_id: self.trace.id().clone(),
            path: path.to_string(),
            reason: reason.into(),
        }
        .into()
    }

    /// Re-tags schema failures as resolution failures of this trace.
    fn schema<T>(&self, path: &AttrPath, result: Result<T>) -> Result<T> {
        result.map_err(|err| match err {
            crate::Error::Schema(schema_err) => self.mismatch(path, schema_err.to_string()),
            other => other,
        })
    }

    fn layout(&self, model: &str, path: &AttrPath) -> Result<Arc<ModelLayout>> {
        self.schema(path, self.catalog.layout(model))
    }

    /// Classifies every traced attribute of `attrs`, failing on the first unknown one.
    fn wanted<'t>(
        &self,
        layout: &ModelLayout,
        attrs: &'t Tree,
        path: &AttrPath,
    ) -> Result<Vec<(&'t str, Wanted<'t>)>> {
        let mut wanted = Vec::with_capacity(attrs.len());
        for (name, value) in attrs.iter() {
            if layout.is_ignored(name) {
                continue;
            }
            let attr_path = path.attr(name.as_str());
            let kind = self.schema(&attr_path, layout.classify_value(name, &attr_path, value))?;
            let entry = match (kind, value) {
                (AttrKind::One(relation), Value::One(child)) => Wanted::One(relation.clone(), child),
                (AttrKind::Many(relation), Value::Many(items)) => {
                    Wanted::Many(relation.clone(), items)
                }
                (_, Value::Scalar(after)) => Wanted::Scalar(after),
                (_, other) => {
                    return Err(self.mismatch(&attr_path, format!("unexpected {} value", other.shape())));
                }
            };
            wanted.push((name.as_str(), entry));
        }
        Ok(wanted)
    }

    fn resolve(
        &self,
        model: &str,
        attrs: &Tree,
        path: &AttrPath,
        from: Option<Trace>,
    ) -> Result<ChangeSet> {
        let layout = self.layout(model, path)?;
        if attrs.is_destroyed() {
            return self.fill(&layout, attrs, ChangeSet::new(), path);
        }
        let wanted = self.wanted(&layout, attrs, path)?;

        let mut set = ChangeSet::new();
        let mut cursor = from;
        while let Some(ancestor) = cursor {
            match path.locate(ancestor.diff()) {
                Located::Missing => {}
                Located::Cleared => break,
                Located::Found(look_at) => {
                    tracing::trace!(
                        trace_id = %self.trace.id(),
                        ancestor = %ancestor.id(),
                        path = %path,
                        "Visiting ancestor"
                    );
                    for (name, entry) in &wanted {
                        if set.contains(name) {
                            continue;
                        }
                        let attr_path = path.attr(*name);
                        match entry {
                            Wanted::Scalar(after) => match look_at.get(name) {
                                None => {}
                                Some(Value::Scalar(before)) => set.insert(
                                    *name,
                                    Change::Scalar {
                                        before: before.clone(),
                                        after: (*after).clone(),
                                    },
                                ),
                                Some(other) => {
                                    return Err(self.mismatch(
                                        &attr_path,
                                        format!(
                                            "ancestor {} stores a {} value for a scalar",
                                            ancestor.id(),
                                            other.shape()
                                        ),
                                    ));
                                }
                            },
                            Wanted::One(relation, child) => {
                                let nested = self.resolve(
                                    &relation.target,
                                    child,
                                    &attr_path,
                                    Some(ancestor.clone()),
                                )?;
                                set.insert(*name, Change::One(nested));
                            }
                            Wanted::Many(relation, items) => {
                                let resolved =
                                    self.resolve_items(relation, items, &attr_path, &ancestor)?;
                                set.insert(*name, Change::Many(resolved));
                            }
                        }
                    }
                }
            }
            if set.len() == wanted.len() {
                return Ok(set);
            }
            cursor = self.previous(&ancestor)?;
        }

        self.fill(&layout, attrs, set, path)
    }

    /// Splits a nested-many list into present and removed items.
    fn resolve_items(
        &self,
        relation: &Relation,
        items: &[Tree],
        path: &AttrPath,
        ancestor: &Trace,
    ) -> Result<Vec<ItemChange>> {
        let mut current = Vec::with_capacity(items.len());
        let mut removed = Vec::new();
        for item in items {
            let Some(id) = item.id() else {
                return Err(self.mismatch(path, "nested item without _id"));
            };
            let item_path = path.item(id);
            // An added item can carry nothing but its id, so order-only items are walked
            // like the rest and only resolve to an unchanged id when an ancestor holds them.
            if item.is_destroyed() {
                removed.push(ItemChange::Removed(self.fill_tree(
                    &relation.target,
                    item,
                    &item_path,
                )?));
            } else {
                current.push(ItemChange::Present(self.resolve(
                    &relation.target,
                    item,
                    &item_path,
                    Some(ancestor.clone()),
                )?));
            }
        }
        current.extend(removed);
        Ok(current)
    }

    fn fill_tree(&self, model: &str, tree: &Tree, path: &AttrPath) -> Result<ChangeSet> {
        let layout = self.layout(model, path)?;
        self.fill(&layout, tree, ChangeSet::new(), path)
    }

    /// Resolves everything still missing from `set` without looking further back.
    fn fill(
        &self,
        layout: &ModelLayout,
        attrs: &Tree,
        mut set: ChangeSet,
        path: &AttrPath,
    ) -> Result<ChangeSet> {
        let destroyed = attrs.is_destroyed();
        for (name, value) in attrs.iter() {
            if layout.is_ignored(name) || set.contains(name) {
                continue;
            }
            let attr_path = path.attr(name.as_str());
            let kind = self.schema(&attr_path, layout.classify_value(name, &attr_path, value))?;
            let change = match (kind, value) {
                (AttrKind::One(relation), Value::One(child)) => {
                    Change::One(self.fill_tree(&relation.target, child, &attr_path)?)
                }
                (AttrKind::Many(relation), Value::Many(items)) => {
                    let mut filled = Vec::with_capacity(items.len());
                    for item in items {
                        let Some(id) = item.id() else {
                            return Err(self.mismatch(&attr_path, "nested item without _id"));
                        };
                        let changes = self.fill_tree(&relation.target, item, &attr_path.item(id))?;
                        filled.push(if item.is_destroyed() {
                            ItemChange::Removed(changes)
                        } else {
                            ItemChange::Present(changes)
                        });
                    }
                    Change::Many(filled)
                }
                (_, Value::Scalar(value)) if destroyed => Change::Scalar {
                    before: value.clone(),
                    after: Scalar::Null,
                },
                (_, Value::Scalar(value)) => Change::Scalar {
                    before: Scalar::Null,
                    after: value.clone(),
                },
                (_, other) => {
                    return Err(self.mismatch(&attr_path, format!("unexpected {} value", other.shape())));
                }
            };
            set.insert(name.as_str(), change);
        }
        Ok(set)
    }
}
