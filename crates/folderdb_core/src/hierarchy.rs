//! Folder hierarchy manager.

use crate::config::HierarchyConfig;
use crate::consistency::ConsistencyReport;
use crate::error::{BatchWriteError, CoreError, CoreResult, WriteFailure};
use crate::folder::{derive_parent_id, Folder, Metadata, StoredFolder, PARENT_ID_FIELD};
use crate::instrument::{drain, IterationSummary};
use crate::seed::{BatchReport, FolderSpec, SeedPlan, SeedReport};
use folderdb_store::{
    to_fields, CollectionPath, Document, DocumentIter, DocumentPath, DocumentStore, FieldFilter,
    StoreError, StoreResult, Transaction,
};
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

/// Lazy sequence of folders decoded from a document sequence.
///
/// A document that does not decode as a folder is yielded as a codec
/// error naming its path.
pub struct FolderIter<'s> {
    inner: DocumentIter<'s>,
}

impl<'s> FolderIter<'s> {
    fn new(inner: DocumentIter<'s>) -> Self {
        Self { inner }
    }

    /// Collects the whole sequence, reporting failures as iteration
    /// errors of the run `name`.
    ///
    /// # Errors
    ///
    /// Returns the first sequence error.
    pub fn collect_all(self, name: &str) -> CoreResult<Vec<StoredFolder>> {
        self.map(|item| item.map_err(|e| CoreError::iteration(name, e)))
            .collect()
    }

    /// Collects the identifiers of the whole sequence.
    ///
    /// # Errors
    ///
    /// Returns the first sequence error.
    pub fn collect_ids(self, name: &str) -> CoreResult<BTreeSet<String>> {
        Ok(self
            .collect_all(name)?
            .into_iter()
            .map(|stored| stored.folder.id)
            .collect())
    }
}

impl Iterator for FolderIter<'_> {
    type Item = StoreResult<StoredFolder>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| item.and_then(decode_folder))
    }
}

fn decode_folder(doc: Document) -> StoreResult<StoredFolder> {
    let folder: Folder = doc
        .decode()
        .map_err(|e| StoreError::codec(format!("{} is not a folder: {e}", doc.path())))?;
    Ok(StoredFolder {
        path: doc.path().clone(),
        folder,
    })
}

/// A folder found by a descendant walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descendant {
    /// Levels below the walk's starting folder (1 = direct child).
    pub depth: usize,
    /// The folder and its path.
    pub stored: StoredFolder,
}

/// Creates and queries folders in a document store.
///
/// Folders live in a flat root collection (`folders/<id>`) and, when
/// nested, in each parent's subcollection (`folders/<id>/folders/<child>`).
/// Nested creation keeps `ParentID` in line with the storage path; flat
/// creation writes `ParentID` exactly as given.
///
/// The store handle is borrowed, so one store can serve several managers.
///
/// # Example
///
/// ```rust
/// use folderdb_core::{FolderHierarchy, FolderSpec};
/// use folderdb_store::{DocumentPath, LocalStore};
///
/// let store = LocalStore::in_memory().unwrap();
/// let folders = FolderHierarchy::open(&store).unwrap();
///
/// let hockey = DocumentPath::new("folders/sports/folders/hockey").unwrap();
/// let stored = folders.create(&FolderSpec::nested(hockey)).unwrap();
/// assert_eq!(stored.folder.parent_id, "sports");
/// ```
pub struct FolderHierarchy<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
    config: HierarchyConfig,
    root: CollectionPath,
}

impl<'s, S: DocumentStore + ?Sized> FolderHierarchy<'s, S> {
    /// Creates a manager over `store`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if the configured collection names are invalid.
    pub fn new(store: &'s S, config: HierarchyConfig) -> CoreResult<Self> {
        config.validate()?;
        let root = CollectionPath::new(config.root_collection.as_str())?;
        Ok(Self {
            store,
            config,
            root,
        })
    }

    /// Creates a manager with the default collection names.
    ///
    /// # Errors
    ///
    /// Returns an error only if the defaults are invalid.
    pub fn open(store: &'s S) -> CoreResult<Self> {
        Self::new(store, HierarchyConfig::default())
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &'s S {
        self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Returns the flat root collection.
    #[must_use]
    pub fn root_collection(&self) -> &CollectionPath {
        &self.root
    }

    /// Path of the root-level folder `id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if `id` is not a valid segment.
    pub fn root_path(&self, id: &str) -> CoreResult<DocumentPath> {
        Ok(self.root.doc(id)?)
    }

    /// Subcollection holding the nested children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if the subcollection name is invalid.
    pub fn children_collection(&self, parent: &DocumentPath) -> CoreResult<CollectionPath> {
        Ok(parent.collection(&self.config.subcollection)?)
    }

    /// Path of the nested folder `id` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if `id` is not a valid segment.
    pub fn child_path(&self, parent: &DocumentPath, id: &str) -> CoreResult<DocumentPath> {
        Ok(self.children_collection(parent)?.doc(id)?)
    }

    /// Resolves a creation request into the path and folder to write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if an identifier is invalid.
    pub fn resolve(&self, spec: &FolderSpec) -> CoreResult<(DocumentPath, Folder)> {
        match spec {
            FolderSpec::Nested { path, metadata } => {
                let folder = Folder {
                    id: path.id().to_string(),
                    parent_id: derive_parent_id(path),
                    metadata: metadata.clone(),
                };
                folder.validate()?;
                Ok((path.clone(), folder))
            }
            FolderSpec::Flat { folder } => {
                folder.validate()?;
                Ok((self.root.doc(&folder.id)?, folder.clone()))
            }
        }
    }

    /// Creates one folder; fails if the document already exists.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists`, `InvalidFolder`, or a store error.
    pub fn create(&self, spec: &FolderSpec) -> CoreResult<StoredFolder> {
        let (path, folder) = self.resolve(spec)?;
        self.store.create(&path, to_fields(&folder)?)?;
        debug!(%path, %folder, "created folder");
        Ok(StoredFolder { path, folder })
    }

    /// Creates one folder at `path`, deriving `ParentID` from the path.
    ///
    /// # Errors
    ///
    /// See [`FolderHierarchy::create`].
    pub fn create_nested(
        &self,
        path: &DocumentPath,
        metadata: Option<Metadata>,
    ) -> CoreResult<StoredFolder> {
        self.create(&FolderSpec::Nested {
            path: path.clone(),
            metadata,
        })
    }

    /// Creates one folder in the root collection with the given `ParentID`.
    ///
    /// # Errors
    ///
    /// See [`FolderHierarchy::create`].
    pub fn create_flat(&self, folder: Folder) -> CoreResult<StoredFolder> {
        self.create(&FolderSpec::flat(folder))
    }

    /// Writes every folder of `specs` in one transaction.
    ///
    /// Folders are written with create-or-replace semantics, so reseeding
    /// the same identifiers is idempotent. Every staging failure is
    /// collected; if any occurred the transaction is aborted and a
    /// `WriteFailure` listing all of them is returned.
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure`, `TransactionLimitExceeded`, `Timeout`,
    /// `InvalidFolder`, or a store error. In every error case no folder
    /// of the batch was written.
    pub fn seed_batch(&self, specs: &[FolderSpec]) -> CoreResult<BatchReport> {
        let resolved = specs
            .iter()
            .map(|spec| self.resolve(spec))
            .collect::<CoreResult<Vec<_>>>()?;

        let mut failures: Vec<WriteFailure> = Vec::new();
        let result = self.store.run_transaction(&mut |tx: &mut dyn Transaction| {
            failures.clear();
            for (path, folder) in &resolved {
                let staged = to_fields(folder).and_then(|fields| tx.set(path, fields));
                if let Err(source) = staged {
                    failures.push(WriteFailure {
                        path: path.to_string(),
                        source,
                    });
                }
            }
            if failures.is_empty() {
                Ok(())
            } else {
                Err(StoreError::aborted(format!(
                    "{} of {} folder writes failed",
                    failures.len(),
                    resolved.len()
                )))
            }
        });

        match result {
            Ok(commit) => {
                info!(
                    folders = resolved.len(),
                    version = commit.version,
                    attempts = commit.attempts,
                    "seeded folder batch"
                );
                Ok(BatchReport {
                    paths: resolved.into_iter().map(|(path, _)| path).collect(),
                    commit,
                })
            }
            Err(_) if !failures.is_empty() => Err(BatchWriteError { failures }.into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Seeds randomly named folders, one transaction per batch.
    ///
    /// Each batch is atomic; batches committed before a failing batch
    /// stay committed.
    ///
    /// # Errors
    ///
    /// Returns the first failing batch's error.
    pub fn seed_random(&self, plan: &SeedPlan) -> CoreResult<SeedReport> {
        let specs = plan.specs(&self.config)?;
        let batch_size = plan
            .batch_size
            .unwrap_or_else(|| self.store.max_writes_per_transaction())
            .max(1);

        let started = Instant::now();
        let mut paths = Vec::with_capacity(specs.len());
        let mut batches = 0;
        for batch in specs.chunks(batch_size) {
            let report = self.seed_batch(batch)?;
            paths.extend(report.paths);
            batches += 1;
        }

        let report = SeedReport {
            paths,
            batches,
            elapsed: started.elapsed(),
        };
        info!(
            folders = report.paths.len(),
            batches,
            elapsed = ?report.elapsed,
            "seed complete"
        );
        Ok(report)
    }

    /// Reads one folder.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the folder does not exist.
    pub fn get(&self, path: &DocumentPath) -> CoreResult<StoredFolder> {
        let doc = self.store.get(path)?;
        Ok(decode_folder(doc)?)
    }

    /// Deletes one folder document. Nested children are left in place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the folder does not exist.
    pub fn delete(&self, path: &DocumentPath) -> CoreResult<()> {
        self.store.delete(path)?;
        debug!(%path, "deleted folder");
        Ok(())
    }

    /// Folders of the flat root collection whose `ParentID` is `parent_id`.
    ///
    /// Nested subcollections are never searched. An empty `parent_id`
    /// also finds root folders written without a `ParentID` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be started.
    pub fn query_by_parent(&self, parent_id: &str) -> CoreResult<FolderIter<'s>> {
        let store: &'s S = self.store;
        let mut filter = FieldFilter::eq_text(PARENT_ID_FIELD, parent_id);
        if parent_id.is_empty() {
            filter = filter.or_missing();
        }
        Ok(FolderIter::new(store.query(&self.root, &filter)?))
    }

    /// Folders stored directly in `parent`'s subcollection, whatever
    /// their `ParentID`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be started.
    pub fn list_children(&self, parent: &DocumentPath) -> CoreResult<FolderIter<'s>> {
        let collection = self.children_collection(parent)?;
        self.scan(&collection)
    }

    /// Folders stored directly in the root collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be started.
    pub fn list_roots(&self) -> CoreResult<FolderIter<'s>> {
        self.scan(&self.root)
    }

    /// Every folder stored directly in `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be started.
    pub fn scan(&self, collection: &CollectionPath) -> CoreResult<FolderIter<'s>> {
        let store: &'s S = self.store;
        Ok(FolderIter::new(store.list_children(collection)?))
    }

    /// Counts the documents stored directly in `collection` by a full scan.
    ///
    /// # Errors
    ///
    /// Returns an iteration error if the scan fails.
    pub fn count_collection(&self, collection: &CollectionPath) -> CoreResult<usize> {
        let store: &'s S = self.store;
        let name = format!("scan {collection}");
        Ok(drain(&name, store.list_children(collection)?, 0)?.matched)
    }

    /// Walks every folder below `root`, one subcollection listing per
    /// folder, level by level.
    ///
    /// `max_depth` bounds the walk (`Some(1)` lists direct children only).
    ///
    /// # Errors
    ///
    /// Returns the first listing error.
    pub fn descendants(
        &self,
        root: &DocumentPath,
        max_depth: Option<usize>,
    ) -> CoreResult<Vec<Descendant>> {
        let mut found = Vec::new();
        let mut pending = VecDeque::from([(root.clone(), 0usize)]);

        while let Some((parent, depth)) = pending.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            let name = format!("children of {parent}");
            for stored in self.list_children(&parent)?.collect_all(&name)? {
                pending.push_back((stored.path.clone(), depth + 1));
                found.push(Descendant {
                    depth: depth + 1,
                    stored,
                });
            }
        }

        debug!(%root, descendants = found.len(), "walked descendants");
        Ok(found)
    }

    /// Compares the flat `ParentID` query with the subcollection listing
    /// for `parent`.
    ///
    /// # Errors
    ///
    /// Returns an iteration error if either query fails.
    pub fn compare_representations(&self, parent: &DocumentPath) -> CoreResult<ConsistencyReport> {
        let parent_id = parent.id();
        let flat = self
            .query_by_parent(parent_id)?
            .collect_ids(&format!("flat ParentID == {parent_id:?}"))?;
        let nested = self
            .list_children(parent)?
            .collect_ids(&format!("children of {parent}"))?;
        Ok(ConsistencyReport::compare(parent_id, flat, nested))
    }

    /// Drains the three query shapes for `parent` and times them.
    ///
    /// The reference total of every run is a full scan of the root
    /// collection, so each percentage is the share of root-level
    /// documents the run returned.
    ///
    /// # Errors
    ///
    /// Returns the first iteration error.
    pub fn measure(&self, parent: &DocumentPath) -> CoreResult<Vec<IterationSummary>> {
        let scan_name = format!("scan {}", self.root);
        let scan = drain(&scan_name, self.list_roots()?, 0)?;
        let total = scan.matched;

        let parent_id = parent.id();
        let flat = drain(
            &format!("flat ParentID == {parent_id:?}"),
            self.query_by_parent(parent_id)?,
            total,
        )?;
        let nested = drain(
            &format!("children of {parent}"),
            self.list_children(parent)?,
            total,
        )?;

        let scan = IterationSummary {
            reference_total: total,
            percentage: crate::instrument::percentage(total, total),
            ..scan
        };
        Ok(vec![scan, flat, nested])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::seed::sports_example;
    use folderdb_store::{LocalStore, StoreConfig};

    fn doc(path: &str) -> DocumentPath {
        DocumentPath::new(path).unwrap()
    }

    #[test]
    fn nested_create_derives_parent() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();

        let root = folders.create_nested(&doc("folders/sports"), None).unwrap();
        assert!(root.folder.is_root());

        let child = folders
            .create_nested(&doc("folders/sports/folders/hockey"), None)
            .unwrap();
        assert_eq!(child.folder.parent_id, "sports");
        assert!(child.is_linked_to_path());

        let read = folders.get(&doc("folders/sports/folders/hockey")).unwrap();
        assert_eq!(read, child);
    }

    #[test]
    fn flat_create_keeps_supplied_parent() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();

        let stored = folders.create_flat(Folder::new("hockey", "sports")).unwrap();
        assert_eq!(stored.path.as_str(), "folders/hockey");
        assert_eq!(stored.folder.parent_id, "sports");
        assert!(!stored.is_linked_to_path());
    }

    #[test]
    fn create_twice_is_already_exists() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        folders.create_flat(Folder::root("a")).unwrap();
        let err = folders.create_flat(Folder::root("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn invalid_ids_rejected_before_writing() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        let err = folders.create_flat(Folder::root("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = folders
            .seed_batch(&[
                FolderSpec::flat(Folder::root("ok")),
                FolderSpec::flat(Folder::new("fine", "bad/parent")),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn example_batch_commits() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        let specs = sports_example(folders.config()).unwrap();

        let report = folders.seed_batch(&specs).unwrap();
        assert_eq!(report.paths.len(), 3);
        assert_eq!(report.commit.writes, 3);

        let ids = folders
            .list_children(&doc("folders/sports"))
            .unwrap()
            .collect_ids("children")
            .unwrap();
        assert_eq!(ids, BTreeSet::from(["baseball".to_string(), "hockey".to_string()]));
    }

    #[test]
    fn batch_failures_are_all_reported() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        store.inject_write_failure(&doc("folders/sports/folders/hockey"));
        store.inject_write_failure(&doc("folders/sports/folders/baseball"));

        let err = folders
            .seed_batch(&sports_example(folders.config()).unwrap())
            .unwrap_err();
        match err {
            CoreError::WriteFailure(batch) => {
                assert_eq!(
                    batch.paths().collect::<Vec<_>>(),
                    vec![
                        "folders/sports/folders/hockey",
                        "folders/sports/folders/baseball"
                    ]
                );
            }
            other => panic!("expected write failure, got {other:?}"),
        }
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn seed_splits_into_batches() {
        let store =
            LocalStore::connect(StoreConfig::default().max_writes_per_transaction(10)).unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();

        let report = folders.seed_random(&SeedPlan::flat("sports", 25)).unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.paths.len(), 25);
        assert_eq!(store.document_count(), 25);
    }

    #[test]
    fn empty_seed_writes_nothing() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        let report = folders.seed_random(&SeedPlan::flat("sports", 0)).unwrap();
        assert_eq!(report.batches, 0);
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn descendants_walk_levels() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        for path in [
            "folders/sports",
            "folders/sports/folders/hockey",
            "folders/sports/folders/hockey/folders/nhl",
            "folders/sports/folders/hockey/folders/nhl/folders/bruins",
            "folders/sports/folders/baseball",
        ] {
            folders.create_nested(&doc(path), None).unwrap();
        }

        let all = folders.descendants(&doc("folders/sports"), None).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.iter().map(|d| d.depth).max(), Some(3));
        assert!(all.iter().all(|d| d.stored.is_linked_to_path()));

        let shallow = folders.descendants(&doc("folders/sports"), Some(1)).unwrap();
        assert_eq!(shallow.len(), 2);
        assert!(shallow.iter().all(|d| d.depth == 1));
    }

    #[test]
    fn root_without_parent_field_is_a_flat_root() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        let mut legacy = folderdb_store::Fields::new();
        legacy.insert("ID".into(), folderdb_store::Value::Text("legacy".into()));
        store.set(&doc("folders/legacy"), legacy).unwrap();
        folders.create_flat(Folder::new("music", "")).unwrap();
        folders.create_flat(Folder::new("hockey", "sports")).unwrap();

        let stored = folders.get(&doc("folders/legacy")).unwrap();
        assert!(stored.folder.is_root());

        let roots = folders.query_by_parent("").unwrap().collect_ids("roots").unwrap();
        assert_eq!(roots, ["legacy", "music"].map(String::from).into());
    }

    #[test]
    fn non_folder_document_is_iteration_error() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        let mut junk = folderdb_store::Fields::new();
        junk.insert("ID".into(), folderdb_store::Value::Integer(7.into()));
        store.set(&doc("folders/junk"), junk).unwrap();

        let err = folders.list_roots().unwrap().collect_all("roots").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IterationError);
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(cause.contains("folders/junk"));
        assert!(!err.to_string().contains("folders/junk"));
    }

    #[test]
    fn measure_reports_three_runs() {
        let store = LocalStore::in_memory().unwrap();
        let folders = FolderHierarchy::open(&store).unwrap();
        folders.seed_random(&SeedPlan::flat("sports", 4)).unwrap();
        folders.seed_random(&SeedPlan::flat("music", 4)).unwrap();
        folders
            .seed_random(&SeedPlan::nested(Some(doc("folders/sports")), 3))
            .unwrap();

        let runs = folders.measure(&doc("folders/sports")).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].matched, 8);
        assert_eq!(runs[0].percentage, 100.0);
        assert_eq!(runs[1].matched, 4);
        assert_eq!(runs[1].percentage, 50.0);
        assert_eq!(runs[2].matched, 3);
    }
}
