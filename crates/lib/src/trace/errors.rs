//! Error types for trace construction.

use thiserror::Error;

/// Reasons a trace cannot be built.
///
/// [`ActionNotTraced`](TraceError::ActionNotTraced) and
/// [`EmptyDiff`](TraceError::EmptyDiff) are expected outcomes for non-mandatory actions;
/// the [`Tracer`](crate::Tracer) turns them into "nothing recorded".
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TraceError {
    /// The model does not trace this action and the action was not mandatory.
    #[error("Action '{action}' is not mandatory and {model} is not tracing it")]
    ActionNotTraced {
        /// Target model
        model: String,
        /// The rejected action
        action: String,
    },

    /// Nothing changed and the action was not mandatory.
    #[error("Empty diff for {model} and action '{action}' is not mandatory")]
    EmptyDiff {
        /// Target model
        model: String,
        /// The rejected action
        action: String,
    },

    /// The target record has no id yet.
    #[error("Cannot trace {model} without an id")]
    MissingTargetId {
        /// Target model
        model: String,
    },
}

impl TraceError {
    /// Check if this error is a skip rather than a failure.
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            TraceError::ActionNotTraced { .. } | TraceError::EmptyDiff { .. }
        )
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        true
    }
}

impl From<TraceError> for crate::Error {
    fn from(err: TraceError) -> Self {
        crate::Error::Trace(err)
    }
}
