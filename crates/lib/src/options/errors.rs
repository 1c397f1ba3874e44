//! Error types for loading tracing configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading [`TraceOptions`](super::TraceOptions).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The configuration text is not valid options JSON.
    #[error("Invalid trace options")]
    Parse {
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file could not be read.
    #[error("Failed to read trace options from {}", path.display())]
    FileIo {
        /// The file that was being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl OptionsError {
    /// Check if this error is a parse failure.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, OptionsError::Parse { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, OptionsError::FileIo { .. })
    }
}

impl From<OptionsError> for crate::Error {
    fn from(err: OptionsError) -> Self {
        crate::Error::Options(err)
    }
}
