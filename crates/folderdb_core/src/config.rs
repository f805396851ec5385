//! Folder hierarchy configuration.

use crate::error::{CoreError, CoreResult};
use folderdb_store::validate_segment;

/// Default name of the flat root collection.
pub const DEFAULT_ROOT_COLLECTION: &str = "folders";

/// Default name of each folder's child subcollection.
pub const DEFAULT_SUBCOLLECTION: &str = "folders";

/// Where folders live in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Name of the flat, root-level folder collection.
    pub root_collection: String,

    /// Name of the subcollection holding a folder's nested children.
    pub subcollection: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            root_collection: DEFAULT_ROOT_COLLECTION.to_string(),
            subcollection: DEFAULT_SUBCOLLECTION.to_string(),
        }
    }
}

impl HierarchyConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root collection name.
    #[must_use]
    pub fn root_collection(mut self, name: impl Into<String>) -> Self {
        self.root_collection = name.into();
        self
    }

    /// Sets the subcollection name.
    #[must_use]
    pub fn subcollection(mut self, name: impl Into<String>) -> Self {
        self.subcollection = name.into();
        self
    }

    /// Checks that both names are valid path segments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` naming the bad collection.
    pub fn validate(&self) -> CoreResult<()> {
        for name in [&self.root_collection, &self.subcollection] {
            validate_segment(name)
                .map_err(|e| CoreError::invalid_folder(name.as_str(), e.to_string()))?;
        }
        Ok(())
    }
}
