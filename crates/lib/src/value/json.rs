//! Plain-JSON encoding of value trees.
//!
//! Hosts that keep diffs in a document store usually want plain map/array/scalar
//! nesting rather than the tagged serde form. Encoding needs nothing but the tree;
//! decoding needs the [`Catalog`] to tell a nested child from an opaque object blob.

use serde_json::Map;

use super::{AttrPath, Scalar, Tree, Value};
use crate::{
    Result,
    constants::DESTROYED_FLAG,
    schema::{AttrKind, Catalog, SchemaError},
};

impl Tree {
    /// Encodes the tree as plain JSON, with the destroyed flag under `$destroyed`.
    pub fn to_json(&self) -> Scalar {
        let mut map = Map::new();
        if self.is_destroyed() {
            map.insert(DESTROYED_FLAG.to_string(), Scalar::Bool(true));
        }
        for (name, value) in self.iter() {
            let encoded = match value {
                Value::Scalar(s) => s.clone(),
                Value::One(child) => child.to_json(),
                Value::Many(items) => Scalar::Array(items.iter().map(Tree::to_json).collect()),
            };
            map.insert(name.clone(), encoded);
        }
        Scalar::Object(map)
    }

    /// Decodes a plain-JSON tree for `model`, classifying every attribute through the catalog.
    ///
    /// Attributes unknown to the current schema are rejected rather than dropped.
    pub fn from_json(catalog: &Catalog, model: &str, json: &Scalar) -> Result<Tree> {
        decode(catalog, model, json, &AttrPath::root())
    }
}

fn mismatch(model: &str, path: &AttrPath, reason: String) -> crate::Error {
    SchemaError::Mismatch {
        model: model.to_string(),
        path: path.to_string(),
        reason,
    }
    .into()
}

fn decode(catalog: &Catalog, model: &str, json: &Scalar, path: &AttrPath) -> Result<Tree> {
    let Scalar::Object(map) = json else {
        return Err(mismatch(model, path, format!("expected an object, found {json}")));
    };
    let layout = catalog.layout(model)?;
    let mut tree = Tree::new();
    for (name, value) in map {
        if name == DESTROYED_FLAG {
            match value {
                Scalar::Bool(flag) => tree.set_destroyed(*flag),
                other => {
                    return Err(mismatch(
                        model,
                        path,
                        format!("destroyed marker must be a boolean, found {other}"),
                    ));
                }
            }
            continue;
        }
        let attr_path = path.attr(name);
        let decoded = match (layout.classify(name, &attr_path)?, value) {
            (_, Scalar::Null) => Value::Scalar(Scalar::Null),
            (AttrKind::Scalar, scalar) => Value::Scalar(scalar.clone()),
            (AttrKind::One(relation), child) => {
                Value::One(decode(catalog, &relation.target, child, &attr_path)?)
            }
            (AttrKind::Many(relation), Scalar::Array(items)) => {
                let mut decoded = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = match item.get(crate::constants::ID_KEY) {
                        Some(id) => attr_path.item(id),
                        None => attr_path.item(&Scalar::from(index)),
                    };
                    decoded.push(decode(catalog, &relation.target, item, &item_path)?);
                }
                Value::Many(decoded)
            }
            (AttrKind::Many(_), other) => {
                return Err(mismatch(
                    model,
                    &attr_path,
                    format!("expected a list of children, found {other}"),
                ));
            }
        };
        tree.insert(name.clone(), decoded);
    }
    Ok(tree)
}
