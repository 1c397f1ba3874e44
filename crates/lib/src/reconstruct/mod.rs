//! Snapshot reconstruction.
//!
//! The state just before a trace is the state just before its successor with the trace's
//! own changes reverted, and the state before the newest trace is the live record. So
//! reconstruction gathers the trace and everything after it, then reverts them newest
//! first, starting from the live record (or an empty shell when none is given).
//!
//! A `create` trace has no "before": reverting past one yields no record, and an older
//! trace reverting from there starts over from a shell.
//!
//! A change-set lists nested-many items in their after-write order, so a reverted list
//! is put back in the order the previous writer of that list left it.

use crate::{
    Result, Trace,
    constants::ID_KEY,
    record::Document,
    resolve::{Change, ChangeSet, ResolveError, resolve_change_set},
    schema::{AttrKind, Catalog},
    store::TraceStore,
    trace::Action,
    value::{AttrPath, Located, Scalar, Value},
};

/// Which side of a trace to reconstruct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The record as it was just before the trace's write.
    Before,
    /// The record as it was just after the trace's write.
    After,
}

/// Materializes the target of `trace` just before or just after its write.
///
/// `live` is the current record, if it still exists. Returns `None` when the record did
/// not exist at that point.
pub fn reconstruct(
    catalog: &Catalog,
    store: &dyn TraceStore,
    trace: &Trace,
    direction: Direction,
    live: Option<&Document>,
) -> Result<Option<Document>> {
    let mut traces = vec![trace.clone()];
    let mut cursor = next(store, trace, trace)?;
    while let Some(later) = cursor {
        cursor = next(store, &later, trace)?;
        traces.push(later);
    }

    let span = match direction {
        Direction::Before => &traces[..],
        Direction::After => &traces[1..],
    };
    tracing::debug!(
        trace_id = %trace.id(),
        ?direction,
        reverted = span.len(),
        "Reconstructing snapshot"
    );

    let mut state = live.cloned();
    for step in span.iter().rev() {
        if *step.action() == Action::Create {
            state = None;
            continue;
        }
        let changes = resolve_change_set(catalog, store, step)?;
        let mut record = state.take().unwrap_or_else(|| {
            Document::new(step.target_model()).with_id(step.target_id().clone())
        });
        Reverter {
            catalog,
            store,
            trace: step,
        }
        .revert(&changes, &mut record, &AttrPath::root())?;
        state = Some(record);
    }
    Ok(state)
}

fn next(store: &dyn TraceStore, of: &Trace, resolving: &Trace) -> Result<Option<Trace>> {
    store.next(of).map_err(|err| {
        ResolveError::BrokenChain {
            trace_id: resolving.id().clone(),
            reason: format!("no next entry for {}: {err}", of.id()),
        }
        .into()
    })
}

struct Reverter<'a> {
    catalog: &'a Catalog,
    store: &'a dyn TraceStore,
    trace: &'a Trace,
}

impl Reverter<'_> {
    fn previous(&self, of: &Trace) -> Result<Option<Trace>> {
        self.store.previous(of).map_err(|err| {
            ResolveError::BrokenChain {
                trace_id: self.trace.id().clone(),
                reason: format!("no previous entry for {}: {err}", of.id()),
            }
            .into()
        })
    }

    /// Item ids of the list `name` under `path` as the nearest earlier trace left it.
    ///
    /// A trace that writes a list writes every live item of it, so that entry alone fixes
    /// the order. `None` when no earlier trace wrote the list since it was last cleared.
    fn prior_order(&self, path: &AttrPath, name: &str) -> Result<Option<Vec<Scalar>>> {
        let mut cursor = self.previous(self.trace)?;
        while let Some(ancestor) = cursor {
            match path.locate(ancestor.diff()) {
                Located::Cleared => return Ok(None),
                Located::Found(tree) => match tree.get(name) {
                    Some(Value::Many(items)) => {
                        let ids = items
                            .iter()
                            .filter(|item| !item.is_destroyed())
                            .filter_map(|item| item.id().cloned())
                            .collect();
                        return Ok(Some(ids));
                    }
                    Some(Value::Scalar(Scalar::Null)) => return Ok(None),
                    _ => {}
                },
                Located::Missing => {}
            }
            cursor = self.previous(&ancestor)?;
        }
        Ok(None)
    }

    fn mismatch(&self, path: &AttrPath, reason: impl Into<String>) -> crate::Error {
        ResolveError::SchemaMismatch {
            trace_id: self.trace.id().clone(),
            path: path.to_string(),
            reason: reason.into(),
        }
        .into()
    }

    /// Puts every `before` value of `changes` back onto `record`.
    fn revert(&self, changes: &ChangeSet, record: &mut Document, path: &AttrPath) -> Result<()> {
        let layout = self
            .catalog
            .layout(record.model())
            .map_err(|err| self.mismatch(path, err.to_string()))?;

        for (name, change) in changes.iter() {
            if name == ID_KEY {
                continue;
            }
            let attr_path = path.attr(name.as_str());
            let kind = layout
                .classify(name, &attr_path)
                .map_err(|err| self.mismatch(&attr_path, err.to_string()))?;

            match (kind, change) {
                (AttrKind::Scalar, Change::Scalar { before, .. }) => {
                    record.set(name.as_str(), before.clone());
                }
                (AttrKind::One(relation), Change::One(nested)) => {
                    if !nested.contains(ID_KEY) {
                        return Err(self.mismatch(&attr_path, "nested change without _id pair"));
                    }
                    let restored = match nested.before_id() {
                        Some(id) => {
                            // The diff was taken against whichever child was there before,
                            // so the live child plus the reverted pairs is the prior child.
                            let mut child = record
                                .take_one(name)
                                .unwrap_or_else(|| Document::new(relation.target.as_str()));
                            child.set(ID_KEY, id.clone());
                            self.revert(nested, &mut child, &attr_path)?;
                            Some(child)
                        }
                        None => None,
                    };
                    record.set_one(name.as_str(), restored);
                }
                (AttrKind::Many(relation), Change::Many(items)) => {
                    let mut existing = record.take_many(name);
                    let mut rebuilt = Vec::with_capacity(items.len());
                    for item in items {
                        let nested = item.changes();
                        if !nested.contains(ID_KEY) {
                            return Err(self.mismatch(&attr_path, "nested item without _id pair"));
                        }
                        let Some(id) = nested.before_id() else {
                            continue;
                        };
                        let mut child = match existing.iter().position(|c| c.id() == Some(id)) {
                            Some(index) => existing.remove(index),
                            None => Document::new(relation.target.as_str()).with_id(id.clone()),
                        };
                        self.revert(nested, &mut child, &attr_path.item(id))?;
                        rebuilt.push(child);
                    }
                    // Items come in their after-write order with removed ones last.
                    if let Some(order) = self.prior_order(path, name)? {
                        rebuilt.sort_by_key(|child| {
                            child
                                .id()
                                .and_then(|id| order.iter().position(|known| known == id))
                                .unwrap_or(usize::MAX)
                        });
                    }
                    record.set_many(name.as_str(), rebuilt);
                }
                (kind, _) => {
                    return Err(self.mismatch(
                        &attr_path,
                        format!("change does not fit a {kind:?} attribute"),
                    ));
                }
            }
        }
        Ok(())
    }
}
