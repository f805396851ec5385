//! Error types for document store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document does not exist.
    #[error("document not found: {path}")]
    NotFound {
        /// Path of the missing document.
        path: String,
    },

    /// The document already exists and the write required it not to.
    #[error("document already exists: {path}")]
    AlreadyExists {
        /// Path of the existing document.
        path: String,
    },

    /// A collection or document path is malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The encoded document exceeds the maximum document size.
    #[error("document {path} is too large: {size} bytes exceeds limit of {limit}")]
    DocumentTooLarge {
        /// Path of the document.
        path: String,
        /// Encoded size in bytes.
        size: usize,
        /// Maximum encoded size in bytes.
        limit: usize,
    },

    /// The store refused a single write.
    #[error("write to {path} rejected: {reason}")]
    WriteRejected {
        /// Path of the rejected write.
        path: String,
        /// Reason given by the store.
        reason: String,
    },

    /// The transaction staged more writes than the store accepts.
    #[error("transaction has {attempted} writes, limit is {limit}")]
    TransactionLimitExceeded {
        /// Number of writes staged.
        attempted: usize,
        /// Maximum writes per transaction.
        limit: usize,
    },

    /// A document read inside a transaction changed before commit.
    #[error("transaction conflict on {path}")]
    Conflict {
        /// Path of the conflicting document.
        path: String,
    },

    /// The transaction closure asked to abort.
    #[error("transaction aborted: {reason}")]
    Aborted {
        /// Reason for the abort.
        reason: String,
    },

    /// An operation ran past the configured deadline.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// The operation that timed out.
        operation: String,
    },

    /// The store could not be reached or configured.
    #[error("connection failed: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// Document encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write rejected error.
    pub fn write_rejected(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Creates a deadline exceeded error.
    pub fn deadline_exceeded(operation: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            operation: operation.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl std::fmt::Display) -> Self {
        Self::Codec(message.to_string())
    }

    /// Returns true if this error means the document is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path() {
        let err = StoreError::not_found("folders/missing");
        assert_eq!(err.to_string(), "document not found: folders/missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn limit_display() {
        let err = StoreError::TransactionLimitExceeded {
            attempted: 501,
            limit: 500,
        };
        assert_eq!(err.to_string(), "transaction has 501 writes, limit is 500");
        assert!(!err.is_not_found());
    }
}
