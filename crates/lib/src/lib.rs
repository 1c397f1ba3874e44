//!
//! Retrace: a sparse-delta audit trail for hierarchical records.
//! This library records every write to a record (and its nested children) as an immutable
//! trace holding only the attributes that changed, and can rebuild the record as it was
//! immediately before or after any of those writes.
//!
//! ## Core Concepts
//!
//! * **Value trees (`value::Tree`)**: Attribute maps whose values are scalars, a nested child tree,
//!   or an ordered list of child trees keyed by `_id`. Full captures and sparse diffs share this shape.
//! * **Catalog (`schema::Catalog`)**: The host's schema reflection combined with the tracing
//!   options, resolved once per model into a closed `AttrKind` per attribute.
//! * **Diffs (`diff`)**: `build_diff` compares a captured tree with a live record; `mark_destroyed`
//!   flags a removed subtree.
//! * **Traces (`trace::Trace`)**: The immutable unit of history, one per tracked write.
//! * **Stores (`store::TraceStore`)**: A pluggable chain storage answering `previous`/`next`.
//! * **Resolution (`resolve`)**: Walks a chain backwards to turn one sparse diff into a full
//!   before/after `ChangeSet`.
//! * **Reconstruction (`reconstruct`)**: Applies change-sets to materialize a historical `Document`.
//! * **Tracer (`tracer::Tracer`)**: The host-facing entry point tying all of the above together.

pub mod clock;
pub mod constants;
pub mod diff;
pub mod options;
pub mod reconstruct;
pub mod record;
pub mod resolve;
pub mod schema;
pub mod store;
pub mod trace;
pub mod tracer;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use diff::{build_diff, mark_destroyed};
pub use options::{ModelOptions, TraceOptions};
pub use reconstruct::{Direction, reconstruct};
pub use record::{Document, Field, LiveValue, Record, capture};
pub use resolve::{Change, ChangeSet, ItemChange, resolve_change_set};
pub use schema::{Catalog, Relation, RelationKind, Schema, StaticSchema};
pub use store::{TraceStore, in_memory::InMemory};
pub use trace::{Action, Trace, TraceId};
pub use tracer::Tracer;
pub use value::{AttrPath, Scalar, Tree, Value};

/// Result type used throughout the Retrace library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Retrace library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured schema errors from the schema module
    #[error(transparent)]
    Schema(schema::SchemaError),

    /// Structured configuration errors from the options module
    #[error(transparent)]
    Options(options::OptionsError),

    /// Structured diff construction errors from the diff module
    #[error(transparent)]
    Diff(diff::DiffError),

    /// Structured trace validation errors from the trace module
    #[error(transparent)]
    Trace(trace::TraceError),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured resolution errors from the resolve module
    #[error(transparent)]
    Resolve(resolve::ResolveError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Schema(_) => "schema",
            Error::Options(_) => "options",
            Error::Diff(_) => "diff",
            Error::Trace(_) => "trace",
            Error::Store(_) => "store",
            Error::Resolve(_) => "resolve",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_not_found(),
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error means stored history no longer matches the current schema.
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_mismatch(),
            Error::Resolve(resolve_err) => resolve_err.is_schema_mismatch(),
            _ => false,
        }
    }

    /// Check if this error means a trace chain could not be walked.
    pub fn is_broken_chain(&self) -> bool {
        match self {
            Error::Resolve(resolve_err) => resolve_err.is_broken_chain(),
            _ => false,
        }
    }

    /// Check if this error reports a structurally invalid diff tree.
    pub fn is_malformed_diff(&self) -> bool {
        matches!(self, Error::Diff(_))
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Diff(_) => true,
            Error::Trace(trace_err) => trace_err.is_validation_error(),
            Error::Options(options_err) => options_err.is_parse_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Store(store_err) => store_err.is_io_error(),
            Error::Options(options_err) => options_err.is_io_error(),
            _ => false,
        }
    }

    /// Get the trace this error was raised for, if any.
    pub fn trace_id(&self) -> Option<&TraceId> {
        match self {
            Error::Resolve(resolve_err) => Some(resolve_err.trace_id()),
            Error::Store(store_err) => store_err.trace_id(),
            _ => None,
        }
    }
}
