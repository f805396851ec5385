//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common folder trees.

use folderdb_core::FolderHierarchy;
use folderdb_store::{Endpoint, LocalStore, StoreConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Project identifier used by every fixture.
pub const TEST_PROJECT: &str = "folderdb-test";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: LocalStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new ephemeral test store.
    pub fn memory() -> Self {
        Self::with_config(StoreConfig::new(TEST_PROJECT))
    }

    /// Creates an ephemeral test store with custom settings.
    ///
    /// The endpoint of `config` is ignored.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: LocalStore::connect(config.endpoint(Endpoint::Memory))
                .expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a store persisted to a fresh temporary directory.
    pub fn persistent() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = LocalStore::connect(Self::dir_config(temp_dir.path()))
            .expect("Failed to open persistent store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Closes the store and opens it again from its directory.
    ///
    /// # Panics
    ///
    /// Panics if the store is ephemeral.
    #[must_use]
    pub fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("Only persistent stores can be reopened");
        drop(self.store);
        let store = LocalStore::connect(Self::dir_config(temp_dir.path()))
            .expect("Failed to reopen persistent store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the data directory if persistent, None if ephemeral.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }

    /// Returns a folder manager with default collection names.
    pub fn hierarchy(&self) -> FolderHierarchy<'_, LocalStore> {
        FolderHierarchy::open(&self.store).expect("Failed to create folder hierarchy")
    }

    fn dir_config(dir: &Path) -> StoreConfig {
        StoreConfig::new(TEST_PROJECT).endpoint(Endpoint::Local(dir.to_path_buf()))
    }
}

impl std::ops::Deref for TestStore {
    type Target = LocalStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a folder manager over a temporary ephemeral store.
pub fn with_hierarchy<F, R>(f: F) -> R
where
    F: FnOnce(&FolderHierarchy<'_, LocalStore>) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.hierarchy())
}

/// Canned folder trees.
pub mod scenarios {
    use folderdb_core::{
        sports_example, BatchReport, Folder, FolderHierarchy, FolderSpec, SeedPlan,
    };
    use folderdb_store::{DocumentPath, DocumentStore};
    use std::collections::BTreeSet;

    /// Writes `sports` with nested `hockey` and `baseball`.
    pub fn sports_tree<S: DocumentStore + ?Sized>(folders: &FolderHierarchy<'_, S>) -> BatchReport {
        let specs = sports_example(folders.config()).expect("Invalid example tree");
        folders.seed_batch(&specs).expect("Failed to seed example tree")
    }

    /// Seeds `count` flat folders with `ParentID == parent_id` and
    /// returns their identifiers.
    pub fn flat_children<S: DocumentStore + ?Sized>(
        folders: &FolderHierarchy<'_, S>,
        parent_id: &str,
        count: usize,
    ) -> BTreeSet<String> {
        folders
            .seed_random(&SeedPlan::flat(parent_id, count))
            .expect("Failed to seed flat folders")
            .ids()
            .map(str::to_string)
            .collect()
    }

    /// Seeds `count` folders into `parent`'s subcollection and returns
    /// their identifiers.
    pub fn nested_children<S: DocumentStore + ?Sized>(
        folders: &FolderHierarchy<'_, S>,
        parent: &DocumentPath,
        count: usize,
    ) -> BTreeSet<String> {
        folders
            .seed_random(&SeedPlan::nested(Some(parent.clone()), count))
            .expect("Failed to seed nested folders")
            .ids()
            .map(str::to_string)
            .collect()
    }

    /// Writes every identifier of `ids` both as a nested child of
    /// `parent` and as a flat folder pointing at it, in one batch.
    pub fn mirrored_children<S: DocumentStore + ?Sized>(
        folders: &FolderHierarchy<'_, S>,
        parent: &DocumentPath,
        ids: &[&str],
    ) {
        let mut specs = Vec::with_capacity(ids.len() * 2);
        for id in ids {
            let path = folders
                .child_path(parent, id)
                .expect("Invalid child identifier");
            specs.push(FolderSpec::nested(path));
            specs.push(FolderSpec::flat(Folder::new(*id, parent.id())));
        }
        folders
            .seed_batch(&specs)
            .expect("Failed to seed mirrored folders");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folderdb_store::{DocumentPath, DocumentStore};

    #[test]
    fn test_memory_store() {
        let test_store = TestStore::memory();
        assert_eq!(test_store.document_count(), 0);
        assert!(test_store.path().is_none());
    }

    #[test]
    fn test_with_hierarchy() {
        with_hierarchy(|folders| {
            let report = scenarios::sports_tree(folders);
            assert_eq!(report.paths.len(), 3);
        });
    }

    #[test]
    fn test_persistent_reopen() {
        let test_store = TestStore::persistent();
        scenarios::sports_tree(&test_store.hierarchy());
        let test_store = test_store.reopen();
        assert_eq!(test_store.document_count(), 3);
        let sports = DocumentPath::new("folders/sports").unwrap();
        assert!(test_store.get(&sports).is_ok());
    }

    #[test]
    fn test_mirrored_scenario() {
        let test_store = TestStore::memory();
        let folders = test_store.hierarchy();
        let parent = DocumentPath::new("folders/sports").unwrap();
        scenarios::mirrored_children(&folders, &parent, &["hockey", "golf"]);
        let report = folders.compare_representations(&parent).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.in_both.len(), 2);
    }
}
