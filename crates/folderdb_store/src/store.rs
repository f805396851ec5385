//! Document store trait definition.

use crate::document::{Document, FieldFilter, Fields};
use crate::error::StoreResult;
use crate::path::{CollectionPath, DocumentPath};

/// A lazy, finite, non-restartable sequence of documents.
///
/// The sequence ends with `None`. An `Err` item means the sequence failed
/// before its natural end; implementations yield no further items after it.
pub type DocumentIter<'a> = Box<dyn Iterator<Item = StoreResult<Document>> + Send + 'a>;

/// Closure run by [`DocumentStore::run_transaction`].
///
/// It may be invoked more than once when the store retries after a conflict.
pub type TransactionFn<'f> = dyn FnMut(&mut dyn Transaction) -> StoreResult<()> + 'f;

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit version assigned to every write of the transaction.
    pub version: u64,
    /// Number of writes applied.
    pub writes: usize,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Reads and staged writes of one transaction attempt.
///
/// Writes are buffered and applied atomically when the closure returns `Ok`.
/// Returning `Err` from the closure discards every staged write.
pub trait Transaction {
    /// Reads a document, seeing writes already staged in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document does not exist.
    fn get(&mut self, path: &DocumentPath) -> StoreResult<Document>;

    /// Stages a create-or-replace write.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write up front
    /// (for example, the document is too large).
    fn set(&mut self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Stages a write that fails the commit if the document exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write up front.
    fn create(&mut self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Stages a delete that fails the commit if the document is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write up front.
    fn delete(&mut self, path: &DocumentPath) -> StoreResult<()>;

    /// Returns the number of writes staged so far.
    fn write_count(&self) -> usize;
}

/// A hierarchical document store.
///
/// # Invariants
///
/// - `run_transaction` applies all staged writes or none of them
/// - A transaction staging more than `max_writes_per_transaction` writes
///   fails with `TransactionLimitExceeded` and has no effect
/// - `query` and `list_children` only see documents stored directly in the
///   given collection, never documents of nested subcollections
/// - Every matching document is yielded exactly once before the sequence ends
///
/// # Implementors
///
/// - [`crate::LocalStore`] - in-process emulator, optionally persisted
pub trait DocumentStore: Send + Sync {
    /// Reads one document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document does not exist.
    fn get(&self, path: &DocumentPath) -> StoreResult<Document>;

    /// Creates or replaces one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected.
    fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Creates one document.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the document exists.
    fn create(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Deletes one document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document does not exist.
    fn delete(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Runs `f` as one atomic transaction.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, `TransactionLimitExceeded`, a commit
    /// precondition failure, `Conflict` once attempts are used up, or
    /// `DeadlineExceeded`.
    fn run_transaction(&self, f: &mut TransactionFn<'_>) -> StoreResult<CommitInfo>;

    /// Returns documents of `collection` whose field matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be started.
    fn query(
        &self,
        collection: &CollectionPath,
        filter: &FieldFilter,
    ) -> StoreResult<DocumentIter<'_>>;

    /// Returns every document stored directly in `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be started.
    fn list_children(&self, collection: &CollectionPath) -> StoreResult<DocumentIter<'_>>;

    /// Maximum number of writes one transaction may stage.
    fn max_writes_per_transaction(&self) -> usize;
}
