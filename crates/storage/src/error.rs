//! Error types for the storage core

use common::file_utils::FilenameValidationError;
use std::io;
use thiserror::Error;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Failures reported by [`crate::Storage`] operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Untrusted input broke the naming rules. Never retried.
    #[error("invalid file name: {0}")]
    InvalidName(#[from] FilenameValidationError),

    #[error("a file named {0:?} already exists")]
    NameCollision(String),

    #[error("file {0:?} not found")]
    NotFound(String),

    #[error("upload of {name:?} rejected: {reason}")]
    QuotaExceeded { name: String, reason: String },

    #[error("failed to write {name:?}: {source}")]
    WriteFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete {name:?}: {source}")]
    DeleteFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Directory scan or metadata lookup failed
    #[error("failed to read storage directory: {source}")]
    ReadFailure {
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Environment failures may succeed on a single retry; input errors never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::WriteFailure { .. }
                | StorageError::DeleteFailure { .. }
                | StorageError::ReadFailure { .. }
        )
    }
}

/// Failure to persist activity counters. Callers log it and carry on.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("failed to persist activity counters to {path}: {source}")]
    PersistenceFailure {
        path: String,
        #[source]
        source: io::Error,
    },
}
