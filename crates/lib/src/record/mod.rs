//! Live record access.
//!
//! The engine reads a host record only through [`Record`]: its model name, its id, and
//! the current value of one attribute at a time. [`Document`] is the crate's own generic
//! record. Reconstruction produces documents, and hosts without typed models can use
//! it directly.

mod document;

use crate::{
    Result,
    constants::ID_KEY,
    diff::DiffError,
    schema::{AttrKind, Catalog, ModelLayout, SchemaError},
    value::{AttrPath, Scalar, Tree, Value},
};

pub use document::{Document, Field};

/// The current value of one attribute of a live record.
#[derive(Debug)]
pub enum LiveValue<'a> {
    /// A leaf value; `Null` also stands for "not set".
    Scalar(Scalar),
    /// A nested-one child, if present.
    One(Option<&'a dyn Record>),
    /// Nested-many children in their current order.
    Many(Vec<&'a dyn Record>),
}

/// Read access to a live host record.
pub trait Record: std::fmt::Debug {
    /// Model name used to look up the record's layout.
    fn model(&self) -> &str;

    /// Stable identifier of the record; `None` before the host assigns one.
    fn id(&self) -> Option<Scalar>;

    /// Current value of `name`.
    ///
    /// Unset attributes may be reported as `LiveValue::Scalar(Scalar::Null)` whatever
    /// their kind; relations treat that as "no child" or "no children".
    fn live_value(&self, name: &str) -> LiveValue<'_>;
}

fn mismatch(layout: &ModelLayout, path: &AttrPath, reason: &str) -> crate::Error {
    SchemaError::Mismatch {
        model: layout.model().to_string(),
        path: path.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Reads a scalar attribute, rejecting relation-shaped values.
pub(crate) fn live_scalar(
    layout: &ModelLayout,
    record: &dyn Record,
    name: &str,
    path: &AttrPath,
) -> Result<Scalar> {
    match record.live_value(name) {
        LiveValue::Scalar(value) => Ok(value),
        LiveValue::One(_) | LiveValue::Many(_) => Err(mismatch(
            layout,
            path,
            "expected a scalar value, found a related record",
        )),
    }
}

/// Reads a nested-one attribute.
pub(crate) fn live_one<'r>(
    layout: &ModelLayout,
    record: &'r dyn Record,
    name: &str,
    path: &AttrPath,
) -> Result<Option<&'r dyn Record>> {
    match record.live_value(name) {
        LiveValue::One(child) => Ok(child),
        LiveValue::Scalar(Scalar::Null) => Ok(None),
        LiveValue::Scalar(_) => Err(mismatch(layout, path, "expected a nested-one value")),
        LiveValue::Many(_) => Err(mismatch(
            layout,
            path,
            "expected a nested-one value, found a list",
        )),
    }
}

/// Reads a nested-many attribute.
pub(crate) fn live_many<'r>(
    layout: &ModelLayout,
    record: &'r dyn Record,
    name: &str,
    path: &AttrPath,
) -> Result<Vec<&'r dyn Record>> {
    match record.live_value(name) {
        LiveValue::Many(children) => Ok(children),
        LiveValue::Scalar(Scalar::Null) => Ok(Vec::new()),
        LiveValue::Scalar(_) => Err(mismatch(layout, path, "expected a nested-many value")),
        LiveValue::One(_) => Err(mismatch(
            layout,
            path,
            "expected a nested-many value, found a single record",
        )),
    }
}

/// Id of a nested-many child, which every child must have.
pub(crate) fn item_id(child: &dyn Record, path: &AttrPath) -> Result<Scalar> {
    child
        .id()
        .filter(|id| !id.is_null())
        .ok_or_else(|| {
            DiffError::MissingItemId {
                path: path.to_string(),
            }
            .into()
        })
}

/// Captures the full attribute tree of a live record.
///
/// Ignored attributes, null scalars, absent nested-one children and empty nested-many
/// lists are left out. The result is the `before` input of a later
/// [`build_diff`](crate::build_diff).
pub fn capture(catalog: &Catalog, record: &dyn Record) -> Result<Tree> {
    capture_at(catalog, record, None, &AttrPath::root())
}

fn capture_at(
    catalog: &Catalog,
    record: &dyn Record,
    skip: Option<&str>,
    path: &AttrPath,
) -> Result<Tree> {
    let layout = catalog.layout(record.model())?;
    let mut tree = Tree::new();
    if let Some(id) = record.id().filter(|id| !id.is_null()) {
        tree.insert(ID_KEY, id);
    }

    for (name, kind) in layout.attributes() {
        if skip == Some(name) {
            continue;
        }
        let attr_path = path.attr(name);
        match kind {
            AttrKind::Scalar => {
                let value = live_scalar(&layout, record, name, &attr_path)?;
                if !value.is_null() {
                    tree.insert(name, value);
                }
            }
            AttrKind::One(relation) => {
                if let Some(child) = live_one(&layout, record, name, &attr_path)? {
                    let captured =
                        capture_at(catalog, child, relation.stripped_key(), &attr_path)?;
                    tree.insert(name, captured);
                }
            }
            AttrKind::Many(relation) => {
                let children = live_many(&layout, record, name, &attr_path)?;
                if children.is_empty() {
                    continue;
                }
                let mut items = Vec::with_capacity(children.len());
                for child in children {
                    let id = item_id(child, &attr_path)?;
                    items.push(capture_at(
                        catalog,
                        child,
                        relation.stripped_key(),
                        &attr_path.item(&id),
                    )?);
                }
                tree.insert(name, Value::Many(items));
            }
        }
    }
    Ok(tree)
}
