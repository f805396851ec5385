//! CLI command implementations.

pub mod bench;
pub mod check;
pub mod probe;
pub mod query;
pub mod seed;
pub mod tree;

use folderdb_core::{CoreResult, FolderHierarchy, Metadata, StoredFolder};
use folderdb_store::{Endpoint, LocalStore, StoreConfig};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type shared by every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Failures that are not store or hierarchy errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A probe observed a different outcome than it expects.
    #[error("{probe} probe expected {expected}, got {actual}")]
    UnexpectedOutcome {
        /// Probe name.
        probe: &'static str,
        /// Expected outcome.
        expected: String,
        /// Observed outcome.
        actual: String,
    },
}

/// State shared by every command of one run.
pub struct Context {
    /// The connected store.
    pub store: LocalStore,
    /// Requested output format.
    pub format: OutputFormat,
}

impl Context {
    /// Connects to the store described by the global flags.
    pub fn connect(
        project: &str,
        emulator_host: &str,
        max_attempts: u32,
        format: OutputFormat,
    ) -> CoreResult<Self> {
        let config = StoreConfig::new(project)
            .endpoint(Endpoint::parse(emulator_host)?)
            .max_attempts(max_attempts);
        debug!(?config, "connecting");
        Ok(Self {
            store: LocalStore::connect(config)?,
            format,
        })
    }

    /// Returns a folder manager over the store.
    pub fn folders(&self) -> CoreResult<FolderHierarchy<'_, LocalStore>> {
        FolderHierarchy::open(&self.store)
    }

    /// Returns true if the store is discarded when the process exits.
    pub fn is_ephemeral(&self) -> bool {
        self.store.config().endpoint == Endpoint::Memory
    }

    /// Warns that writes of `command` will not outlive this run.
    pub fn warn_if_ephemeral(&self, command: &str) {
        if self.is_ephemeral() {
            warn!(command, "writing to a memory store; nothing is kept after exit");
        }
    }

    /// Returns true if JSON output was requested.
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// A folder as printed by the listing commands.
#[derive(Debug, Serialize)]
pub struct FolderRow {
    /// Storage path.
    pub path: String,
    /// Folder identifier.
    pub id: String,
    /// Logical parent identifier.
    pub parent_id: String,
    /// Metadata, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl From<StoredFolder> for FolderRow {
    fn from(stored: StoredFolder) -> Self {
        Self {
            path: stored.path.to_string(),
            id: stored.folder.id,
            parent_id: stored.folder.parent_id,
            metadata: stored.folder.metadata,
        }
    }
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
pub(crate) fn memory_context(format: OutputFormat) -> Context {
    Context::connect("folderdb-test", "memory", 1, format).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_endpoint_is_ephemeral() {
        assert!(memory_context(OutputFormat::Text).is_ephemeral());

        let dir = tempfile::TempDir::new().unwrap();
        let host = dir.path().to_string_lossy().into_owned();
        let ctx = Context::connect("folderdb-test", &host, 1, OutputFormat::Text).unwrap();
        assert!(!ctx.is_ephemeral());
    }
}
