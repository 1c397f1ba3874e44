//! Host schema reflection.
//!
//! The engine never inspects host types directly. It asks a [`Schema`] which attributes a
//! model has and whether a given attribute is a nested-one or nested-many relation. The
//! [`Catalog`] combines those answers with the [`TraceOptions`](crate::TraceOptions) and
//! caches one [`ModelLayout`] per model, so the hot paths match on a closed [`AttrKind`]
//! instead of re-querying the host per attribute.

mod catalog;
pub mod errors;
mod static_schema;

pub use catalog::{AttrKind, Catalog, ModelLayout};
pub use errors::SchemaError;
pub use static_schema::{ModelBuilder, StaticSchema};

use serde::{Deserialize, Serialize};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// The owner holds at most one child.
    One,
    /// The owner holds an ordered list of children.
    Many,
}

/// Description of a relation attribute as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Nested-one or nested-many.
    pub kind: RelationKind,
    /// Model name of the children.
    pub target: String,
    /// Attribute on the child pointing back at the owner, for referenced relations.
    pub foreign_key: Option<String>,
    /// Embedded children live inside the owner's document; referenced ones do not.
    pub embedded: bool,
}

impl Relation {
    /// An embedded relation of the given kind.
    pub fn embedded(kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            foreign_key: None,
            embedded: true,
        }
    }

    /// A referenced relation whose children point back through `foreign_key`.
    pub fn referenced(
        kind: RelationKind,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            foreign_key: Some(foreign_key.into()),
            embedded: false,
        }
    }

    /// The child attribute left out of traces: the foreign key of a referenced relation.
    pub fn stripped_key(&self) -> Option<&str> {
        if self.embedded {
            None
        } else {
            self.foreign_key.as_deref()
        }
    }
}

/// Reflection interface implemented by the host.
///
/// Implementations must be cheap to call repeatedly but need not cache; the
/// [`Catalog`] resolves each model once.
pub trait Schema: Send + Sync {
    /// All attribute names of `model` in declaration order, relations included.
    ///
    /// Returns `None` when the model is unknown.
    fn attribute_names(&self, model: &str) -> Option<Vec<String>>;

    /// Describes `name` on `model` when it is a relation.
    fn relation(&self, model: &str, name: &str) -> Option<Relation>;

    /// Attributes the host itself never wants traced.
    fn ignored(&self, _model: &str) -> Vec<String> {
        Vec::new()
    }
}
