//! Error types for malformed diff trees.

use thiserror::Error;

/// Structural problems that make a diff tree unfit for storage.
///
/// These are raised while building or validating a diff and are never persisted.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DiffError {
    /// A nested-many item has no `_id`.
    #[error("Nested item without _id at {path}")]
    MissingItemId {
        /// Path of the nested-many attribute
        path: String,
    },

    /// Two items of one nested-many list share an id.
    #[error("Duplicate item id {id} at {path}")]
    DuplicateItemId {
        /// Path of the nested-many attribute
        path: String,
        /// The repeated id, rendered as JSON
        id: String,
    },

    /// A destroyed subtree contains a child that is not itself destroyed.
    #[error("Live child inside destroyed subtree at {path}")]
    ConflictingMarkers {
        /// Path of the offending child
        path: String,
    },
}

impl DiffError {
    /// The attribute path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            DiffError::MissingItemId { path }
            | DiffError::DuplicateItemId { path, .. }
            | DiffError::ConflictingMarkers { path } => path,
        }
    }

    /// Check if this error is about item identity.
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            DiffError::MissingItemId { .. } | DiffError::DuplicateItemId { .. }
        )
    }
}

impl From<DiffError> for crate::Error {
    fn from(err: DiffError) -> Self {
        crate::Error::Diff(err)
    }
}
