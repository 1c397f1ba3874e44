//! Builder for creating validated [`Trace`] entries.

use super::{Action, Trace, TraceError, TraceId};
use crate::{
    Result,
    diff::validate_diff,
    schema::ModelLayout,
    value::{Scalar, Tree},
};

/// A builder for [`Trace`] entries.
///
/// `build` is the only way to obtain a trace, so every stored entry has passed the same
/// checks: a target id, a well-formed diff, and for non-mandatory actions a traced action
/// with a non-empty diff.
///
/// ```ignore
/// let trace = Trace::builder("Post", 1)
///     .action_name("publish!")
///     .message(Some("go live".into()))
///     .created_at(clock.now_millis())
///     .diff(diff)
///     .build(&layout)?;
/// ```
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    id: Option<TraceId>,
    target_model: String,
    target_id: Scalar,
    created_at: u64,
    action: Action,
    mandatory: bool,
    message: Option<String>,
    author_id: Option<String>,
    diff: Tree,
}

impl TraceBuilder {
    /// Creates a builder for an `update` trace with an empty diff.
    pub fn new(target_model: impl Into<String>, target_id: impl Into<Scalar>) -> Self {
        Self {
            id: None,
            target_model: target_model.into(),
            target_id: target_id.into(),
            created_at: 0,
            action: Action::Update,
            mandatory: false,
            message: None,
            author_id: None,
            diff: Tree::new(),
        }
    }

    /// Uses a fixed id instead of a generated one.
    pub fn id(mut self, id: impl Into<TraceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the action.
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Sets the action from its name; a trailing `!` makes it mandatory.
    pub fn action_name(mut self, name: &str) -> Self {
        let (action, mandatory) = Action::parse(name);
        self.action = action;
        self.mandatory = mandatory;
        self
    }

    /// Records the trace even when its diff is empty or its action is not traced.
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Sets the free-text message.
    pub fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Sets the author reference.
    pub fn author(mut self, author_id: Option<String>) -> Self {
        self.author_id = author_id;
        self
    }

    /// Sets the creation time in milliseconds.
    pub fn created_at(mut self, millis: u64) -> Self {
        self.created_at = millis;
        self
    }

    /// Sets the diff tree.
    pub fn diff(mut self, diff: Tree) -> Self {
        self.diff = diff;
        self
    }

    /// Validates and finalizes the trace against the target model's layout.
    pub fn build(self, layout: &ModelLayout) -> Result<Trace> {
        if self.target_id.is_null() {
            return Err(TraceError::MissingTargetId {
                model: self.target_model,
            }
            .into());
        }
        validate_diff(&self.diff)?;

        if !self.mandatory {
            if !layout.traces_action(self.action.as_str()) {
                return Err(TraceError::ActionNotTraced {
                    model: self.target_model,
                    action: self.action.to_string(),
                }
                .into());
            }
            if self.diff.is_empty() {
                return Err(TraceError::EmptyDiff {
                    model: self.target_model,
                    action: self.action.to_string(),
                }
                .into());
            }
        }

        Ok(Trace {
            id: self.id.unwrap_or_else(TraceId::generate),
            target_model: self.target_model,
            target_id: self.target_id,
            created_at: self.created_at,
            seq: 0,
            action: self.action,
            message: self.message,
            author_id: self.author_id,
            diff: self.diff,
        })
    }
}
