//! Storage error types for the document store abstraction.

/// Errors that can occur while executing a filter against a store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The filter cannot be evaluated (bad regex, misplaced operator).
    #[error("Invalid filter: {message}")]
    InvalidFilter {
        /// Description of what is wrong with the filter.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `InvalidFilter` error.
    #[must_use]
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
