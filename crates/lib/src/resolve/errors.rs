//! Error types for change-set resolution and reconstruction.

use thiserror::Error;

use crate::TraceId;

/// Errors raised while resolving or applying a trace's change-set.
///
/// Every variant names the trace being resolved, so callers can report which history
/// entry could not be interpreted.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Stored history refers to an attribute the current schema cannot classify.
    #[error("Schema mismatch resolving trace {trace_id} at {path}: {reason}")]
    SchemaMismatch {
        /// The trace being resolved
        trace_id: TraceId,
        /// Rendered attribute path
        path: String,
        /// What did not match
        reason: String,
    },

    /// The store failed to deliver an adjacent entry.
    #[error("Broken chain resolving trace {trace_id}: {reason}")]
    BrokenChain {
        /// The trace being resolved
        trace_id: TraceId,
        /// The store failure
        reason: String,
    },
}

impl ResolveError {
    /// Check if this error reports incompatible history.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, ResolveError::SchemaMismatch { .. })
    }

    /// Check if this error reports a chain walk failure.
    pub fn is_broken_chain(&self) -> bool {
        matches!(self, ResolveError::BrokenChain { .. })
    }

    /// The trace that was being resolved.
    pub fn trace_id(&self) -> &TraceId {
        match self {
            ResolveError::SchemaMismatch { trace_id, .. }
            | ResolveError::BrokenChain { trace_id, .. } => trace_id,
        }
    }

    /// The offending attribute path, if the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ResolveError::SchemaMismatch { path, .. } => Some(path),
            ResolveError::BrokenChain { .. } => None,
        }
    }
}

impl From<ResolveError> for crate::Error {
    fn from(err: ResolveError) -> Self {
        crate::Error::Resolve(err)
    }
}
