//! Store connection configuration.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default maximum number of writes in one transaction.
pub const DEFAULT_MAX_WRITES: usize = 500;

/// Default number of attempts for a conflicting transaction.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default number of documents fetched per page of a lazy sequence.
pub const DEFAULT_PAGE_SIZE: usize = 300;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Ephemeral in-process store.
    #[default]
    Memory,
    /// Persistent emulator rooted at a directory.
    Local(PathBuf),
}

impl Endpoint {
    /// Parses an endpoint string.
    ///
    /// `memory` and `mem://` select the in-process store. A `file://`
    /// prefix is stripped; anything else is taken as a directory path.
    ///
    /// # Errors
    ///
    /// Returns a connection error for an empty endpoint.
    pub fn parse(value: &str) -> StoreResult<Self> {
        let value = value.trim();
        match value {
            "" => Err(StoreError::connection("empty endpoint")),
            "memory" | "mem://" => Ok(Self::Memory),
            other => {
                let path = other.strip_prefix("file://").unwrap_or(other);
                if path.is_empty() {
                    return Err(StoreError::connection("empty endpoint path"));
                }
                Ok(Self::Local(PathBuf::from(path)))
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Local(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// Configuration for connecting to a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project (namespace) identifier.
    pub project_id: String,

    /// Store location.
    pub endpoint: Endpoint,

    /// Maximum writes accepted by one transaction.
    pub max_writes_per_transaction: usize,

    /// Attempts made for a transaction that hits a conflict (at least 1).
    pub max_attempts: u32,

    /// Documents fetched per page of a lazy sequence.
    pub page_size: usize,

    /// Bound on each transaction and each page fetch of a lazy sequence
    /// (`None` = unbounded).
    pub deadline: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: "folderdb-dev".to_string(),
            endpoint: Endpoint::Memory,
            max_writes_per_transaction: DEFAULT_MAX_WRITES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            page_size: DEFAULT_PAGE_SIZE,
            deadline: None,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for `project_id` with default values.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the per-transaction write limit.
    #[must_use]
    pub const fn max_writes_per_transaction(mut self, limit: usize) -> Self {
        self.max_writes_per_transaction = limit;
        self
    }

    /// Sets the number of transaction attempts.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the page size for lazy sequences.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the operation deadline.
    #[must_use]
    pub const fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Checks the configuration before connecting.
    ///
    /// # Errors
    ///
    /// Returns a connection error describing the first invalid setting.
    pub fn validate(&self) -> StoreResult<()> {
        let valid_project = !self.project_id.is_empty()
            && self
                .project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_project {
            return Err(StoreError::connection(format!(
                "invalid project id {:?}",
                self.project_id
            )));
        }
        if self.max_writes_per_transaction == 0 {
            return Err(StoreError::connection("max writes per transaction must be > 0"));
        }
        if self.max_attempts == 0 {
            return Err(StoreError::connection("max attempts must be > 0"));
        }
        if self.page_size == 0 {
            return Err(StoreError::connection("page size must be > 0"));
        }
        Ok(())
    }
}
