//! Local document store emulator.

mod dir;
mod iter;
mod transaction;

pub use transaction::{LocalTransaction, PendingWrite};

use crate::config::{Endpoint, StoreConfig};
use crate::document::{encoded_size, Document, FieldFilter, Fields, MAX_DOCUMENT_SIZE};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocumentPath};
use crate::store::{CommitInfo, DocumentIter, DocumentStore, TransactionFn};
use dir::{LocalDir, Snapshot, SnapshotEntry, FORMAT_VERSION};
use iter::PagedIter;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A stored document and the commit that wrote it.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub fields: Fields,
    pub version: u64,
}

/// Committed documents keyed by full path.
#[derive(Debug)]
pub(crate) struct State {
    pub docs: BTreeMap<String, Entry>,
    pub next_version: u64,
}

impl State {
    fn empty() -> Self {
        Self {
            docs: BTreeMap::new(),
            next_version: 1,
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let docs = snapshot
            .documents
            .into_iter()
            .map(|e| {
                (
                    e.path,
                    Entry {
                        fields: e.fields,
                        version: e.version,
                    },
                )
            })
            .collect();
        Self {
            docs,
            next_version: snapshot.next_version,
        }
    }

    fn to_snapshot(&self, project_id: &str) -> Snapshot {
        Snapshot {
            format_version: FORMAT_VERSION,
            project_id: project_id.to_string(),
            next_version: self.next_version,
            documents: self
                .docs
                .iter()
                .map(|(path, entry)| SnapshotEntry {
                    path: path.clone(),
                    version: entry.version,
                    fields: entry.fields.clone(),
                })
                .collect(),
        }
    }

    pub fn version_of(&self, path: &str) -> Option<u64> {
        self.docs.get(path).map(|e| e.version)
    }
}

/// State shared by the store handle, its transactions and its iterators.
#[derive(Debug)]
pub(crate) struct Shared {
    pub config: StoreConfig,
    pub state: RwLock<State>,
    dir: Option<LocalDir>,
    faults: RwLock<HashSet<String>>,
}

impl Shared {
    /// Fails with `DeadlineExceeded` once `started` is older than the deadline.
    pub fn check_deadline(&self, started: Instant, operation: &str) -> StoreResult<()> {
        match self.config.deadline {
            Some(deadline) if started.elapsed() >= deadline => {
                Err(StoreError::deadline_exceeded(operation))
            }
            _ => Ok(()),
        }
    }

    /// Validates a single write before it is staged.
    pub fn check_write(&self, path: &DocumentPath, fields: &Fields) -> StoreResult<()> {
        if self.faults.read().contains(path.as_str()) {
            return Err(StoreError::write_rejected(path.as_str(), "injected failure"));
        }
        let size = encoded_size(fields)?;
        if size > MAX_DOCUMENT_SIZE {
            return Err(StoreError::DocumentTooLarge {
                path: path.to_string(),
                size,
                limit: MAX_DOCUMENT_SIZE,
            });
        }
        Ok(())
    }

    /// Applies staged writes atomically.
    ///
    /// Read versions are validated first, then write preconditions, then
    /// every write is applied under one commit version. With a data
    /// directory the snapshot is saved before the commit is acknowledged;
    /// a failed save rolls the in-memory state back.
    pub fn commit(
        &self,
        reads: &HashMap<String, Option<u64>>,
        writes: Vec<(DocumentPath, PendingWrite)>,
        started: Instant,
    ) -> StoreResult<CommitInfo> {
        let limit = self.config.max_writes_per_transaction;
        if writes.len() > limit {
            return Err(StoreError::TransactionLimitExceeded {
                attempted: writes.len(),
                limit,
            });
        }
        self.check_deadline(started, "commit")?;

        let mut state = self.state.write();

        for (path, seen) in reads {
            if state.version_of(path) != *seen {
                return Err(StoreError::Conflict { path: path.clone() });
            }
        }

        // Preconditions are checked in staging order so that a create
        // after a delete of the same document within one transaction holds.
        let mut exists: HashMap<&str, bool> = HashMap::new();
        for (path, write) in &writes {
            let key = path.as_str();
            let present = *exists
                .entry(key)
                .or_insert_with(|| state.docs.contains_key(key));
            match write {
                PendingWrite::Create(_) if present => {
                    return Err(StoreError::already_exists(key));
                }
                PendingWrite::Delete if !present => {
                    return Err(StoreError::not_found(key));
                }
                _ => {}
            }
            exists.insert(key, !matches!(write, PendingWrite::Delete));
        }

        let version = state.next_version;
        let count = writes.len();
        let mut undo: Vec<(String, Option<Entry>)> = Vec::with_capacity(count);

        for (path, write) in writes {
            let key = path.as_str().to_string();
            let previous = match write {
                PendingWrite::Set(fields) | PendingWrite::Create(fields) => {
                    state.docs.insert(key.clone(), Entry { fields, version })
                }
                PendingWrite::Delete => state.docs.remove(&key),
            };
            undo.push((key, previous));
        }
        state.next_version += 1;

        if let Some(dir) = &self.dir {
            if let Err(err) = dir.save(&state.to_snapshot(&self.config.project_id)) {
                warn!(error = %err, "snapshot save failed, rolling back commit");
                for (key, previous) in undo.into_iter().rev() {
                    match previous {
                        Some(entry) => state.docs.insert(key, entry),
                        None => state.docs.remove(&key),
                    };
                }
                state.next_version -= 1;
                return Err(err);
            }
        }

        debug!(version, writes = count, "transaction committed");

        Ok(CommitInfo {
            version,
            writes: count,
            attempts: 1,
        })
    }
}

/// In-process document store emulating a hosted document database.
///
/// All documents live in an ordered map keyed by full path. With a
/// [`Endpoint::Local`] endpoint the map is persisted to a snapshot file
/// after every commit and reloaded on connect.
///
/// The handle is cheap to clone; clones share the same documents.
///
/// # Example
///
/// ```rust
/// use folderdb_store::{DocumentPath, DocumentStore, Fields, LocalStore, StoreConfig};
///
/// let store = LocalStore::connect(StoreConfig::default()).unwrap();
/// let path = DocumentPath::new("folders/sports").unwrap();
/// store.create(&path, Fields::new()).unwrap();
/// assert!(store.get(&path).is_ok());
/// assert!(store.create(&path, Fields::new()).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
}

impl LocalStore {
    /// Connects to the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the configuration is invalid, the
    /// emulator directory is missing or locked, or its snapshot cannot
    /// be read.
    pub fn connect(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let (dir, state) = match &config.endpoint {
            Endpoint::Memory => (None, State::empty()),
            Endpoint::Local(path) => {
                let dir = LocalDir::open(path, &config.project_id)?;
                let state = match dir.load()? {
                    Some(snapshot) => State::from_snapshot(snapshot),
                    None => State::empty(),
                };
                (Some(dir), state)
            }
        };

        info!(
            project = %config.project_id,
            endpoint = %config.endpoint,
            documents = state.docs.len(),
            "connected to document store"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(state),
                dir,
                faults: RwLock::new(HashSet::new()),
            }),
        })
    }

    /// Creates an ephemeral store with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error only if the default configuration is invalid.
    pub fn in_memory() -> StoreResult<Self> {
        Self::connect(StoreConfig::default())
    }

    /// Returns the configuration the store was connected with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Returns the total number of stored documents at every depth.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.shared.state.read().docs.len()
    }

    /// Makes every future write to `path` fail when it is staged.
    ///
    /// Intended for tests that exercise batch failure handling.
    pub fn inject_write_failure(&self, path: &DocumentPath) {
        self.shared.faults.write().insert(path.as_str().to_string());
    }

    /// Removes all injected write failures.
    pub fn clear_write_failures(&self) {
        self.shared.faults.write().clear();
    }

    fn single_write(&self, path: &DocumentPath, write: PendingWrite) -> StoreResult<()> {
        if let PendingWrite::Set(fields) | PendingWrite::Create(fields) = &write {
            self.shared.check_write(path, fields)?;
        }
        self.shared
            .commit(&HashMap::new(), vec![(path.clone(), write)], Instant::now())?;
        Ok(())
    }
}

impl DocumentStore for LocalStore {
    fn get(&self, path: &DocumentPath) -> StoreResult<Document> {
        let state = self.shared.state.read();
        state
            .docs
            .get(path.as_str())
            .map(|entry| Document::new(path.clone(), entry.fields.clone(), entry.version))
            .ok_or_else(|| StoreError::not_found(path.as_str()))
    }

    fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.single_write(path, PendingWrite::Set(fields))
    }

    fn create(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.single_write(path, PendingWrite::Create(fields))
    }

    fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        self.single_write(path, PendingWrite::Delete)
    }

    fn run_transaction(&self, f: &mut TransactionFn<'_>) -> StoreResult<CommitInfo> {
        let started = Instant::now();
        let max_attempts = self.shared.config.max_attempts;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.shared.check_deadline(started, "transaction")?;

            let mut txn = LocalTransaction::new(&self.shared);
            if let Err(err) = f(&mut txn) {
                debug!(attempt, error = %err, "transaction closure failed, discarding writes");
                return Err(err);
            }

            let (reads, writes) = txn.into_parts();
            match self.shared.commit(&reads, writes, started) {
                Ok(info) => {
                    return Ok(CommitInfo {
                        attempts: attempt,
                        ..info
                    })
                }
                Err(StoreError::Conflict { path }) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, %path, "transaction conflict, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn query(
        &self,
        collection: &CollectionPath,
        filter: &FieldFilter,
    ) -> StoreResult<DocumentIter<'_>> {
        Ok(Box::new(PagedIter::new(&self.shared, collection, Some(filter.clone()))))
    }

    fn list_children(&self, collection: &CollectionPath) -> StoreResult<DocumentIter<'_>> {
        Ok(Box::new(PagedIter::new(&self.shared, collection, None)))
    }

    fn max_writes_per_transaction(&self) -> usize {
        self.shared.config.max_writes_per_transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::document::Value;
    use crate::store::Transaction;
    use std::time::Duration;
    use tempfile::TempDir;

    fn doc(path: &str) -> DocumentPath {
        DocumentPath::new(path).unwrap()
    }

    fn col(path: &str) -> CollectionPath {
        CollectionPath::new(path).unwrap()
    }

    fn fields(parent: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("ParentID".into(), Value::Text(parent.into()));
        f
    }

    fn ids(iter: DocumentIter<'_>) -> Vec<String> {
        let mut ids: Vec<String> = iter.map(|d| d.unwrap().id().to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn create_get_delete() {
        let store = LocalStore::in_memory().unwrap();
        let path = doc("folders/a");

        store.create(&path, fields("")).unwrap();
        let got = store.get(&path).unwrap();
        assert_eq!(got.id(), "a");
        assert_eq!(got.version(), 1);

        assert!(matches!(
            store.create(&path, fields("")),
            Err(StoreError::AlreadyExists { .. })
        ));

        store.delete(&path).unwrap();
        assert!(store.get(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = LocalStore::in_memory().unwrap();
        let err = store.delete(&doc("folders/ghost")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn set_replaces() {
        let store = LocalStore::in_memory().unwrap();
        let path = doc("folders/a");
        store.set(&path, fields("x")).unwrap();
        store.set(&path, fields("y")).unwrap();
        let got = store.get(&path).unwrap();
        assert_eq!(got.get("ParentID"), Some(&Value::Text("y".into())));
        assert_eq!(got.version(), 2);
    }

    #[test]
    fn transaction_commits_all() {
        let store = LocalStore::in_memory().unwrap();
        let info = store
            .run_transaction(&mut |tx: &mut dyn Transaction| {
                tx.set(&doc("folders/sports"), fields(""))?;
                tx.set(&doc("folders/sports/folders/hockey"), fields("sports"))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(info.writes, 2);
        assert_eq!(info.attempts, 1);
        assert_eq!(store.document_count(), 2);
    }

    #[test]
    fn closure_error_discards_writes() {
        let store = LocalStore::in_memory().unwrap();
        let result = store.run_transaction(&mut |tx: &mut dyn Transaction| {
            tx.set(&doc("folders/a"), fields(""))?;
            Err(StoreError::aborted("changed my mind"))
        });
        assert!(matches!(result, Err(StoreError::Aborted { .. })));
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn transaction_limit_is_inclusive() {
        let store =
            LocalStore::connect(StoreConfig::default().max_writes_per_transaction(3)).unwrap();

        let write_n = |n: usize| {
            store.run_transaction(&mut |tx: &mut dyn Transaction| {
                for i in 0..n {
                    tx.set(&doc(&format!("folders/n{n}_{i}")), fields(""))?;
                }
                Ok(())
            })
        };

        let err = write_n(4).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TransactionLimitExceeded {
                attempted: 4,
                limit: 3
            }
        ));
        assert_eq!(store.document_count(), 0);

        write_n(3).unwrap();
        assert_eq!(store.document_count(), 3);
    }

    #[test]
    fn failed_precondition_rolls_back() {
        let store = LocalStore::in_memory().unwrap();
        store.set(&doc("folders/taken"), fields("")).unwrap();

        let result = store.run_transaction(&mut |tx: &mut dyn Transaction| {
            tx.create(&doc("folders/fresh"), fields(""))?;
            tx.create(&doc("folders/taken"), fields(""))?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
        assert!(store.get(&doc("folders/fresh")).is_err());
    }

    #[test]
    fn injected_failure_rejects_staging() {
        let store = LocalStore::in_memory().unwrap();
        let bad = doc("folders/bad");
        store.inject_write_failure(&bad);

        let err = store.set(&bad, fields("")).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { .. }));

        store.clear_write_failures();
        store.set(&bad, fields("")).unwrap();
    }

    #[test]
    fn oversized_document_rejected() {
        let store = LocalStore::in_memory().unwrap();
        let mut big = Fields::new();
        big.insert("blob".into(), Value::Text("x".repeat(MAX_DOCUMENT_SIZE)));
        let err = store.set(&doc("folders/big"), big).unwrap_err();
        assert!(matches!(err, StoreError::DocumentTooLarge { .. }));
    }

    #[test]
    fn conflict_retries_then_succeeds() {
        let store = LocalStore::in_memory().unwrap();
        let counter = doc("meta/counter");
        store.set(&counter, fields("0")).unwrap();

        let mut runs = 0;
        let info = store
            .run_transaction(&mut |tx: &mut dyn Transaction| {
                runs += 1;
                tx.get(&counter)?;
                if runs == 1 {
                    // Concurrent writer sneaks in between read and commit.
                    store.set(&counter, fields("1"))?;
                }
                tx.set(&counter, fields("2"))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(runs, 2);
        assert_eq!(info.attempts, 2);
        let got = store.get(&counter).unwrap();
        assert_eq!(got.get("ParentID"), Some(&Value::Text("2".into())));
    }

    #[test]
    fn single_attempt_surfaces_conflict() {
        let store = LocalStore::connect(StoreConfig::default().max_attempts(1)).unwrap();
        let counter = doc("meta/counter");
        store.set(&counter, fields("0")).unwrap();

        let result = store.run_transaction(&mut |tx: &mut dyn Transaction| {
            tx.get(&counter)?;
            store.set(&counter, fields("1"))?;
            tx.set(&counter, fields("2"))?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        let got = store.get(&counter).unwrap();
        assert_eq!(got.get("ParentID"), Some(&Value::Text("1".into())));
    }

    #[test]
    fn zero_deadline_times_out() {
        let store =
            LocalStore::connect(StoreConfig::default().deadline(Some(Duration::ZERO))).unwrap();
        let result = store.run_transaction(&mut |_tx: &mut dyn Transaction| Ok(()));
        assert!(matches!(result, Err(StoreError::DeadlineExceeded { .. })));

        let mut iter = store.list_children(&col("folders")).unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(StoreError::DeadlineExceeded { .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn deadline_bounds_each_page_not_the_drain() {
        let config = StoreConfig::default()
            .page_size(1)
            .deadline(Some(Duration::from_millis(50)));
        let store = LocalStore::connect(config).unwrap();
        for id in ["a", "b", "c"] {
            store.set(&doc(&format!("folders/{id}")), fields("sports")).unwrap();
        }

        let mut iter = store
            .query(&col("folders"), &FieldFilter::eq_text("ParentID", "sports"))
            .unwrap();
        assert!(matches!(iter.next(), Some(Ok(_))));
        std::thread::sleep(Duration::from_millis(80));
        assert!(matches!(iter.next(), Some(Ok(_))));
        std::thread::sleep(Duration::from_millis(80));
        assert!(matches!(iter.next(), Some(Ok(_))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn list_children_is_one_level() {
        let store = LocalStore::in_memory().unwrap();
        store.set(&doc("folders/sports"), fields("")).unwrap();
        store.set(&doc("folders/music"), fields("")).unwrap();
        store
            .set(&doc("folders/sports/folders/hockey"), fields("sports"))
            .unwrap();
        store.set(&doc("foldersx/other"), fields("")).unwrap();

        assert_eq!(
            ids(store.list_children(&col("folders")).unwrap()),
            vec!["music", "sports"]
        );
        assert_eq!(
            ids(store.list_children(&col("folders/sports/folders")).unwrap()),
            vec!["hockey"]
        );
    }

    #[test]
    fn query_filters_top_level_only() {
        let store = LocalStore::in_memory().unwrap();
        store.set(&doc("folders/hockey"), fields("sports")).unwrap();
        store.set(&doc("folders/jazz"), fields("music")).unwrap();
        store
            .set(&doc("folders/sports/folders/baseball"), fields("sports"))
            .unwrap();

        let filter = FieldFilter::eq_text("ParentID", "sports");
        assert_eq!(
            ids(store.query(&col("folders"), &filter).unwrap()),
            vec!["hockey"]
        );
    }

    #[test]
    fn paging_yields_each_document_once() {
        let store = LocalStore::connect(StoreConfig::default().page_size(7)).unwrap();
        store
            .run_transaction(&mut |tx: &mut dyn Transaction| {
                for i in 0..50 {
                    tx.set(&doc(&format!("folders/f{i:03}")), fields(""))?;
                    tx.set(&doc(&format!("folders/f{i:03}/folders/c")), fields(""))?;
                }
                Ok(())
            })
            .unwrap();

        let got = ids(store.list_children(&col("folders")).unwrap());
        assert_eq!(got.len(), 50);
        let mut dedup = got.clone();
        dedup.dedup();
        assert_eq!(dedup, got);
    }

    #[test]
    fn persisted_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new("proj").endpoint(Endpoint::Local(temp.path().to_path_buf()));

        {
            let store = LocalStore::connect(config.clone()).unwrap();
            store.set(&doc("folders/a"), fields("")).unwrap();
            store.set(&doc("folders/a/folders/b"), fields("a")).unwrap();
        }

        let store = LocalStore::connect(config).unwrap();
        assert_eq!(store.document_count(), 2);
        let b = store.get(&doc("folders/a/folders/b")).unwrap();
        assert_eq!(b.version(), 2);

        store.set(&doc("folders/c"), fields("")).unwrap();
        assert_eq!(store.get(&doc("folders/c")).unwrap().version(), 3);
    }

    #[test]
    fn locked_directory_refuses_second_connection() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new("proj").endpoint(Endpoint::Local(temp.path().to_path_buf()));
        let _first = LocalStore::connect(config.clone()).unwrap();
        assert!(matches!(
            LocalStore::connect(config),
            Err(StoreError::Connection { .. })
        ));
    }
}
