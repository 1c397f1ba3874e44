//! Error types for schema reflection and attribute classification.

use thiserror::Error;

/// Errors raised while classifying attributes against the host schema.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema knows no model by this name.
    #[error("Unknown model: {model}")]
    UnknownModel {
        /// The model name that was looked up
        model: String,
    },

    /// An attribute does not match what the current schema says about it.
    #[error("Schema mismatch on {model} at {path}: {reason}")]
    Mismatch {
        /// The model owning the attribute
        model: String,
        /// Rendered attribute path from the traced record
        path: String,
        /// What did not match
        reason: String,
    },

    /// The layout cache lock was poisoned by a panicking writer.
    #[error("Layout cache lock poisoned")]
    LockPoisoned,
}

impl SchemaError {
    /// Check if this error indicates a model was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::UnknownModel { .. })
    }

    /// Check if this error reports an attribute/shape mismatch.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, SchemaError::Mismatch { .. })
    }

    /// Check if this error comes from a poisoned layout cache.
    pub fn is_lock_poisoned(&self) -> bool {
        matches!(self, SchemaError::LockPoisoned)
    }

    /// The attribute path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            SchemaError::Mismatch { path, .. } => Some(path),
            SchemaError::UnknownModel { .. } | SchemaError::LockPoisoned => None,
        }
    }
}

impl From<SchemaError> for crate::Error {
    fn from(err: SchemaError) -> Self {
        crate::Error::Schema(err)
    }
}
