//! Per-model attribute layouts, resolved once and cached.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use super::{Relation, RelationKind, Schema, SchemaError};
use crate::{
    Result, TraceOptions,
    constants::ID_KEY,
    value::{AttrPath, Value},
};

/// How the engine treats one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrKind {
    /// A leaf value compared as a unit.
    Scalar,
    /// A nested-one relation.
    One(Relation),
    /// A nested-many relation.
    Many(Relation),
}

impl AttrKind {
    /// The relation behind this attribute, if any.
    pub fn relation(&self) -> Option<&Relation> {
        match self {
            AttrKind::Scalar => None,
            AttrKind::One(r) | AttrKind::Many(r) => Some(r),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            AttrKind::Scalar => "scalar",
            AttrKind::One(_) => "nested-one",
            AttrKind::Many(_) => "nested-many",
        }
    }
}

/// Resolved description of one model: every known attribute with its kind, plus the
/// tracing options that apply to it.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    model: String,
    order: Vec<String>,
    kinds: HashMap<String, AttrKind>,
    ignored: BTreeSet<String>,
    actions: Vec<String>,
}

impl ModelLayout {
    fn resolve(schema: &dyn Schema, options: &TraceOptions, model: &str) -> Result<Self> {
        let names = schema
            .attribute_names(model)
            .ok_or_else(|| SchemaError::UnknownModel {
                model: model.to_string(),
            })?;
        let opts = options.for_model(model);

        let mut ignored: BTreeSet<String> = opts.ignore.iter().cloned().collect();
        ignored.extend(schema.ignored(model));
        ignored.remove(ID_KEY);

        let mut order = Vec::with_capacity(names.len() + opts.include.len());
        let mut kinds = HashMap::with_capacity(names.len() + 1);
        kinds.insert(ID_KEY.to_string(), AttrKind::Scalar);

        for name in names.into_iter().chain(opts.include.iter().cloned()) {
            if name == ID_KEY || kinds.contains_key(&name) {
                continue;
            }
            let kind = match schema.relation(model, &name) {
                Some(relation) => {
                    if !relation.embedded && !opts.references.contains(&name) {
                        ignored.insert(name.clone());
                    }
                    match relation.kind {
                        RelationKind::One => AttrKind::One(relation),
                        RelationKind::Many => AttrKind::Many(relation),
                    }
                }
                None => AttrKind::Scalar,
            };
            order.push(name.clone());
            kinds.insert(name, kind);
        }

        Ok(Self {
            model: model.to_string(),
            order,
            kinds,
            ignored,
            actions: opts.actions,
        })
    }

    /// The model this layout describes.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Traced attributes in declaration order, `_id` and ignored attributes excluded.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttrKind)> {
        self.order
            .iter()
            .filter(|name| !self.ignored.contains(*name))
            .filter_map(|name| self.kinds.get(name).map(|kind| (name.as_str(), kind)))
    }

    /// The kind of any known attribute, ignored or not.
    pub fn kind(&self, name: &str) -> Option<&AttrKind> {
        self.kinds.get(name)
    }

    /// True when the attribute must never appear in a trace.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// True when traces for `action` are recorded for this model.
    pub fn traces_action(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|a| a == action)
    }

    /// Classifies `name`, failing when the current schema no longer knows it.
    pub fn classify(&self, name: &str, path: &AttrPath) -> Result<&AttrKind> {
        self.kinds.get(name).ok_or_else(|| {
            SchemaError::Mismatch {
                model: self.model.clone(),
                path: path.to_string(),
                reason: format!("attribute '{name}' is not part of the current schema"),
            }
            .into()
        })
    }

    /// Classifies `name` and checks that a stored value has the shape the schema expects.
    pub fn classify_value(&self, name: &str, path: &AttrPath, value: &Value) -> Result<&AttrKind> {
        let kind = self.classify(name, path)?;
        let matches = matches!(
            (kind, value),
            (AttrKind::Scalar, Value::Scalar(_))
                | (AttrKind::One(_), Value::One(_))
                | (AttrKind::Many(_), Value::Many(_))
        );
        if !matches {
            return Err(SchemaError::Mismatch {
                model: self.model.clone(),
                path: path.to_string(),
                reason: format!(
                    "expected a {} value, found {}",
                    kind.shape(),
                    value.shape()
                ),
            }
            .into());
        }
        Ok(kind)
    }
}

/// Schema plus options, with a per-model layout cache.
///
/// `Catalog` is `Send + Sync`; layouts are immutable once resolved and shared via `Arc`.
pub struct Catalog {
    schema: Arc<dyn Schema>,
    options: TraceOptions,
    layouts: RwLock<HashMap<String, Arc<ModelLayout>>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Creates a catalog over a host schema.
    pub fn new(schema: impl Schema + 'static, options: TraceOptions) -> Self {
        Self::from_shared(Arc::new(schema), options)
    }

    /// Creates a catalog over a schema that is shared with other parts of the host.
    pub fn from_shared(schema: Arc<dyn Schema>, options: TraceOptions) -> Self {
        Self {
            schema,
            options,
            layouts: RwLock::new(HashMap::new()),
        }
    }

    /// The options this catalog applies.
    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// Returns the layout for `model`, resolving it on first use.
    pub fn layout(&self, model: &str) -> Result<Arc<ModelLayout>> {
        if let Some(layout) = self
            .layouts
            .read()
            .map_err(|_| SchemaError::LockPoisoned)?
            .get(model)
        {
            return Ok(Arc::clone(layout));
        }

        let layout = Arc::new(ModelLayout::resolve(
            self.schema.as_ref(),
            &self.options,
            model,
        )?);
        tracing::trace!(model, attributes = layout.order.len(), "Resolved model layout");

        self.layouts
            .write()
            .map_err(|_| SchemaError::LockPoisoned)?
            .insert(model.to_string(), Arc::clone(&layout));
        Ok(layout)
    }
}
