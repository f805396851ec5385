//! Error types for folder hierarchy operations.

use folderdb_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// One folder write that failed inside a batch.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct WriteFailure {
    /// Path of the folder that could not be written.
    pub path: String,
    /// Underlying store error.
    #[source]
    pub source: StoreError,
}

/// Every folder write that failed in one batch.
///
/// The batch is aborted as a whole, so none of its folders were written,
/// including the ones that did not fail.
#[derive(Debug)]
pub struct BatchWriteError {
    /// Failed writes, in staging order.
    pub failures: Vec<WriteFailure>,
}

impl BatchWriteError {
    /// Returns the paths of the failed writes.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.path.as_str())
    }
}

impl fmt::Display for BatchWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} folder write(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  * {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchWriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// Errors that can occur in folder hierarchy operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The folder does not exist.
    #[error("folder not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The folder already exists.
    #[error("folder already exists: {path}")]
    AlreadyExists {
        /// Path of the existing folder.
        path: String,
    },

    /// One or more writes of a batch failed; nothing was written.
    #[error(transparent)]
    WriteFailure(#[from] BatchWriteError),

    /// The batch exceeded the store's per-transaction write cap.
    #[error("transaction limit exceeded: {attempted} writes, limit is {limit}")]
    TransactionLimitExceeded {
        /// Writes in the batch.
        attempted: usize,
        /// Store limit.
        limit: usize,
    },

    /// A lazy sequence failed before reaching its end.
    #[error("iteration {name:?} failed")]
    Iteration {
        /// Name of the drained sequence.
        name: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The store could not be reached or configured.
    #[error("connection failed: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// An operation ran past its deadline.
    #[error("timed out during {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// A folder identifier, path or configuration value is invalid.
    #[error("invalid folder {id:?}: {reason}")]
    InvalidFolder {
        /// The offending identifier or path.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Any other store error.
    #[error(transparent)]
    Store(StoreError),
}

/// Coarse classification of a [`CoreError`], for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing document.
    NotFound,
    /// Existing document.
    AlreadyExists,
    /// Batch write failure.
    WriteFailure,
    /// Per-transaction cap exceeded.
    TransactionLimitExceeded,
    /// Lazy sequence failure.
    IterationError,
    /// Client construction failure.
    ConnectionError,
    /// Deadline exceeded.
    Timeout,
    /// Rejected input.
    InvalidInput,
    /// Anything else from the store.
    StoreError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::WriteFailure => "WriteFailure",
            Self::TransactionLimitExceeded => "TransactionLimitExceeded",
            Self::IterationError => "IterationError",
            Self::ConnectionError => "ConnectionError",
            Self::Timeout => "Timeout",
            Self::InvalidInput => "InvalidInput",
            Self::StoreError => "StoreError",
        };
        f.write_str(name)
    }
}

impl CoreError {
    /// Creates an invalid folder error.
    pub fn invalid_folder(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFolder {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an error raised while draining the sequence `name`.
    ///
    /// A deadline hit is reported as [`CoreError::Timeout`].
    pub fn iteration(name: impl Into<String>, source: StoreError) -> Self {
        let name = name.into();
        match source {
            StoreError::DeadlineExceeded { .. } => Self::Timeout { operation: name },
            source => Self::Iteration { name, source },
        }
    }

    /// Returns the error's kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::WriteFailure(_) => ErrorKind::WriteFailure,
            Self::TransactionLimitExceeded { .. } => ErrorKind::TransactionLimitExceeded,
            Self::Iteration { .. } => ErrorKind::IterationError,
            Self::Connection { .. } => ErrorKind::ConnectionError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::InvalidFolder { .. } => ErrorKind::InvalidInput,
            Self::Store(_) => ErrorKind::StoreError,
        }
    }

    /// Returns true if this error means the folder is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { path } => Self::NotFound { path },
            StoreError::AlreadyExists { path } => Self::AlreadyExists { path },
            StoreError::TransactionLimitExceeded { attempted, limit } => {
                Self::TransactionLimitExceeded { attempted, limit }
            }
            StoreError::Connection { message } => Self::Connection { message },
            StoreError::DeadlineExceeded { operation } => Self::Timeout { operation },
            StoreError::InvalidPath { path, reason } => Self::InvalidFolder { id: path, reason },
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_kinds() {
        let err: CoreError = StoreError::not_found("folders/x").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_not_found());

        let err: CoreError = StoreError::TransactionLimitExceeded {
            attempted: 501,
            limit: 500,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::TransactionLimitExceeded);

        let err: CoreError = StoreError::deadline_exceeded("commit").into();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err: CoreError = StoreError::connection("no such host").into();
        assert_eq!(err.kind(), ErrorKind::ConnectionError);

        let err: CoreError = StoreError::Conflict {
            path: "folders/x".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn iteration_maps_deadline_to_timeout() {
        let err = CoreError::iteration("flat", StoreError::deadline_exceeded("iteration"));
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = CoreError::iteration("flat", StoreError::codec("bad bytes"));
        assert_eq!(err.kind(), ErrorKind::IterationError);
        assert!(err.to_string().contains("flat"));
    }

    #[test]
    fn batch_error_lists_every_failure() {
        let err = BatchWriteError {
            failures: vec![
                WriteFailure {
                    path: "folders/a".into(),
                    source: StoreError::write_rejected("folders/a", "boom"),
                },
                WriteFailure {
                    path: "folders/b".into(),
                    source: StoreError::write_rejected("folders/b", "bang"),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 folder write(s) failed"));
        assert!(text.contains("folders/a"));
        assert!(text.contains("bang"));
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["folders/a", "folders/b"]);

        let core: CoreError = err.into();
        assert_eq!(core.kind(), ErrorKind::WriteFailure);
    }
}
