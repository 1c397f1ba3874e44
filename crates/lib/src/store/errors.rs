//! Error types for trace storage.

use thiserror::Error;

use crate::TraceId;

/// Errors that can occur while storing or walking trace chains.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry with this id is stored.
    #[error("Trace not found: {id}")]
    TraceNotFound {
        /// The ID of the trace that was not found
        id: TraceId,
    },

    /// An entry with this id was already appended.
    #[error("Trace already stored: {id}")]
    DuplicateTrace {
        /// The ID of the duplicate trace
        id: TraceId,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Trace store lock poisoned")]
    LockPoisoned,

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Check if this error indicates a trace was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::TraceNotFound { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, StoreError::FileIo { .. })
    }

    /// Check if this error is serialization related.
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            StoreError::SerializationFailed { .. } | StoreError::DeserializationFailed { .. }
        )
    }

    /// Get the trace ID associated with this error, if any.
    pub fn trace_id(&self) -> Option<&TraceId> {
        match self {
            StoreError::TraceNotFound { id } | StoreError::DuplicateTrace { id } => Some(id),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
