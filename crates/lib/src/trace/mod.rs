//! Trace entries: the immutable unit of history.
//!
//! A [`Trace`] records one write to one target: which model and id, when, which action,
//! and the sparse diff captured at write time. Traces for the same target form a chain
//! ordered by `(created_at, seq)`, where `seq` is assigned by the store on append.

mod builder;
pub mod errors;
mod id;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use builder::TraceBuilder;
pub use errors::TraceError;
pub use id::TraceId;

use crate::{
    constants::MANDATORY_SUFFIX,
    value::{Scalar, Tree},
};

/// What kind of write a trace records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// The record was created.
    Create,
    /// The record was saved again.
    Update,
    /// The record was removed.
    Destroy,
    /// A host-defined action such as `"publish"`.
    Custom(String),
}

impl Action {
    /// The action name as stored.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Custom(name) => name,
        }
    }

    /// Parses an action name; a trailing `!` marks it mandatory and is stripped.
    ///
    /// ```
    /// use retrace::Action;
    ///
    /// assert_eq!(Action::parse("publish!"), (Action::Custom("publish".into()), true));
    /// assert_eq!(Action::parse("update"), (Action::Update, false));
    /// ```
    pub fn parse(name: &str) -> (Action, bool) {
        match name.strip_suffix(MANDATORY_SUFFIX) {
            Some(stripped) => (Action::from(stripped), true),
            None => (Action::from(name), false),
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "create" => Action::Create,
            "update" => Action::Update,
            "destroy" => Action::Destroy,
            other => Action::Custom(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::from(name.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry of a trace chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    id: TraceId,
    target_model: String,
    target_id: Scalar,
    created_at: u64,
    #[serde(default)]
    seq: u64,
    action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_id: Option<String>,
    diff: Tree,
}

impl Trace {
    /// Starts building a trace for one target.
    pub fn builder(target_model: impl Into<String>, target_id: impl Into<Scalar>) -> TraceBuilder {
        TraceBuilder::new(target_model, target_id)
    }

    /// Unique identifier of this entry.
    pub fn id(&self) -> &TraceId {
        &self.id
    }

    /// Model name of the traced record.
    pub fn target_model(&self) -> &str {
        &self.target_model
    }

    /// Id of the traced record.
    pub fn target_id(&self) -> &Scalar {
        &self.target_id
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Creation time as a UTC timestamp, when representable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.created_at)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Store-assigned sequence number; zero until appended.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Sets the sequence number. Only [`TraceStore`](crate::TraceStore) implementations
    /// should call this, once, from `append`.
    pub fn assign_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    /// The recorded action.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Free-text message given by the writer.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Author reference stamped at write time.
    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    /// The sparse diff captured at write time.
    pub fn diff(&self) -> &Tree {
        &self.diff
    }

    /// Position of this entry within its chain.
    pub fn order_key(&self) -> (u64, u64) {
        (self.created_at, self.seq)
    }

    /// Key shared by every entry of the same target.
    pub fn chain_key(&self) -> String {
        chain_key(&self.target_model, &self.target_id)
    }
}

/// Key of the chain for `(model, target_id)`.
pub fn chain_key(model: &str, target_id: &Scalar) -> String {
    format!("{model}#{target_id}")
}
