//! A declarative [`Schema`] for hosts without runtime reflection, and for tests.

use std::collections::HashMap;

use super::{Relation, RelationKind, Schema};

#[derive(Debug, Clone, Default)]
struct ModelDef {
    attributes: Vec<String>,
    relations: HashMap<String, Relation>,
    ignored: Vec<String>,
}

/// A schema assembled in code.
///
/// # Example
///
/// ```
/// use retrace::{Schema, StaticSchema};
///
/// let schema = StaticSchema::new()
///     .model("Post", |m| {
///         m.field("title")
///             .embeds_many("tags", "Tag")
///             .has_many("comments", "Comment", "post_id")
///     })
///     .model("Tag", |m| m.field("label"))
///     .model("Comment", |m| m.field("body").field("post_id"));
///
/// assert!(schema.relation("Post", "tags").is_some());
/// assert!(schema.relation("Post", "title").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    models: HashMap<String, ModelDef>,
}

impl StaticSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or replaces) a model.
    pub fn model(
        mut self,
        name: impl Into<String>,
        define: impl FnOnce(ModelBuilder) -> ModelBuilder,
    ) -> Self {
        let builder = define(ModelBuilder::default());
        self.models.insert(name.into(), builder.def);
        self
    }
}

impl Schema for StaticSchema {
    fn attribute_names(&self, model: &str) -> Option<Vec<String>> {
        self.models.get(model).map(|def| def.attributes.clone())
    }

    fn relation(&self, model: &str, name: &str) -> Option<Relation> {
        self.models
            .get(model)
            .and_then(|def| def.relations.get(name))
            .cloned()
    }

    fn ignored(&self, model: &str) -> Vec<String> {
        self.models
            .get(model)
            .map(|def| def.ignored.clone())
            .unwrap_or_default()
    }
}

/// Builder for one model of a [`StaticSchema`].
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    def: ModelDef,
}

impl ModelBuilder {
    /// Declares a scalar attribute.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.push(name.into());
        self
    }

    /// Declares an embedded nested-one relation.
    pub fn embeds_one(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(name, Relation::embedded(RelationKind::One, target))
    }

    /// Declares an embedded nested-many relation.
    pub fn embeds_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(name, Relation::embedded(RelationKind::Many, target))
    }

    /// Declares a referenced nested-one relation.
    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(
            name,
            Relation::referenced(RelationKind::One, target, foreign_key),
        )
    }

    /// Declares a referenced nested-many relation.
    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(
            name,
            Relation::referenced(RelationKind::Many, target, foreign_key),
        )
    }

    /// Declares an arbitrary relation.
    pub fn relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        let name = name.into();
        self.push(name.clone());
        self.def.relations.insert(name, relation);
        self
    }

    /// Excludes an attribute from tracing at the schema level.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.def.ignored.push(name.into());
        self
    }

    fn push(&mut self, name: String) {
        if !self.def.attributes.contains(&name) {
            self.def.attributes.push(name);
        }
    }
}
