//! Generic in-memory record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::{LiveValue, Record};
use crate::{constants::ID_KEY, value::Scalar};

/// One attribute of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// A leaf value, never `Null`.
    Scalar(Scalar),
    /// A nested-one child.
    One(Box<Document>),
    /// Nested-many children in order, never empty.
    Many(Vec<Document>),
}

/// A schema-less record: a model name plus named fields.
///
/// Setting a scalar to `Null`, a child to `None`, or a list to empty removes the field,
/// so "unset" and "null" are the same state.
///
/// ```
/// use retrace::Document;
///
/// let post = Document::new("Post")
///     .with_id(1)
///     .with("title", "Hello")
///     .with_many("tags", vec![Document::new("Tag").with_id(1).with("v", "x")]);
/// assert_eq!(post.many("tags").len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    model: String,
    fields: BTreeMap<String, Field>,
}

impl Document {
    /// Creates an empty document of `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style id.
    pub fn with_id(self, id: impl Into<Scalar>) -> Self {
        self.with(ID_KEY, id)
    }

    /// Builder-style scalar field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style nested-one child.
    pub fn with_one(mut self, name: impl Into<String>, child: Document) -> Self {
        self.set_one(name, Some(child));
        self
    }

    /// Builder-style nested-many children.
    pub fn with_many(mut self, name: impl Into<String>, children: Vec<Document>) -> Self {
        self.set_many(name, children);
        self
    }

    /// The model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The `_id` field, if set.
    pub fn id(&self) -> Option<&Scalar> {
        self.scalar(ID_KEY)
    }

    /// Sets a scalar field; `Null` removes it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        let name = name.into();
        match value.into() {
            Scalar::Null => {
                self.fields.remove(&name);
            }
            value => {
                self.fields.insert(name, Field::Scalar(value));
            }
        }
    }

    /// A scalar field.
    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.fields.get(name) {
            Some(Field::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Sets or removes a nested-one child.
    pub fn set_one(&mut self, name: impl Into<String>, child: Option<Document>) {
        let name = name.into();
        match child {
            Some(child) => {
                self.fields.insert(name, Field::One(Box::new(child)));
            }
            None => {
                self.fields.remove(&name);
            }
        }
    }

    /// A nested-one child.
    pub fn one(&self, name: &str) -> Option<&Document> {
        match self.fields.get(name) {
            Some(Field::One(child)) => Some(child),
            _ => None,
        }
    }

    /// Removes and returns a nested-one child.
    pub fn take_one(&mut self, name: &str) -> Option<Document> {
        match self.fields.remove(name) {
            Some(Field::One(child)) => Some(*child),
            Some(other) => {
                self.fields.insert(name.to_string(), other);
                None
            }
            None => None,
        }
    }

    /// Replaces the whole child list at once; an empty list removes the field.
    pub fn set_many(&mut self, name: impl Into<String>, children: Vec<Document>) {
        let name = name.into();
        if children.is_empty() {
            self.fields.remove(&name);
        } else {
            self.fields.insert(name, Field::Many(children));
        }
    }

    /// Nested-many children; empty when unset.
    pub fn many(&self, name: &str) -> &[Document] {
        match self.fields.get(name) {
            Some(Field::Many(children)) => children,
            _ => &[],
        }
    }

    /// Removes and returns the child list.
    pub fn take_many(&mut self, name: &str) -> Vec<Document> {
        match self.fields.remove(name) {
            Some(Field::Many(children)) => children,
            Some(other) => {
                self.fields.insert(name.to_string(), other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Plain JSON rendering, mostly useful for assertions and logs.
    pub fn to_json(&self) -> Scalar {
        let map: Map<String, Scalar> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let value = match field {
                    Field::Scalar(value) => value.clone(),
                    Field::One(child) => child.to_json(),
                    Field::Many(children) => {
                        Scalar::Array(children.iter().map(Document::to_json).collect())
                    }
                };
                (name.clone(), value)
            })
            .collect();
        Scalar::Object(map)
    }
}

impl Record for Document {
    fn model(&self) -> &str {
        &self.model
    }

    fn id(&self) -> Option<Scalar> {
        Document::id(self).cloned()
    }

    fn live_value(&self, name: &str) -> LiveValue<'_> {
        match self.fields.get(name) {
            Some(Field::Scalar(value)) => LiveValue::Scalar(value.clone()),
            Some(Field::One(child)) => LiveValue::One(Some(child.as_ref())),
            Some(Field::Many(children)) => {
                LiveValue::Many(children.iter().map(|c| c as &dyn Record).collect())
            }
            None => LiveValue::Scalar(Scalar::Null),
        }
    }
}
