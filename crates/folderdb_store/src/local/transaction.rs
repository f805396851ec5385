//! Transaction attempt against the local store.

use super::Shared;
use crate::document::{Document, Fields};
use crate::error::{StoreError, StoreResult};
use crate::path::DocumentPath;
use crate::store::Transaction;
use std::collections::HashMap;

/// A write staged inside a transaction.
#[derive(Debug, Clone)]
pub enum PendingWrite {
    /// Create or replace the document.
    Set(Fields),
    /// Create the document; the commit fails if it exists.
    Create(Fields),
    /// Delete the document; the commit fails if it is missing.
    Delete,
}

/// One attempt of a local transaction.
///
/// Reads go straight to committed state and record the version they saw;
/// the commit fails with `Conflict` if any of those versions changed.
/// Writes are buffered in staging order.
#[derive(Debug)]
pub struct LocalTransaction<'a> {
    shared: &'a Shared,
    /// Path -> version observed (`None` = document absent).
    reads: HashMap<String, Option<u64>>,
    writes: Vec<(DocumentPath, PendingWrite)>,
}

impl<'a> LocalTransaction<'a> {
    pub(crate) fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        HashMap<String, Option<u64>>,
        Vec<(DocumentPath, PendingWrite)>,
    ) {
        (self.reads, self.writes)
    }

    fn pending(&self, path: &DocumentPath) -> Option<&PendingWrite> {
        self.writes
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, w)| w)
    }
}

impl Transaction for LocalTransaction<'_> {
    fn get(&mut self, path: &DocumentPath) -> StoreResult<Document> {
        if let Some(write) = self.pending(path) {
            return match write {
                PendingWrite::Set(fields) | PendingWrite::Create(fields) => {
                    Ok(Document::new(path.clone(), fields.clone(), 0))
                }
                PendingWrite::Delete => Err(StoreError::not_found(path.as_str())),
            };
        }

        let state = self.shared.state.read();
        let entry = state.docs.get(path.as_str());
        self.reads
            .entry(path.as_str().to_string())
            .or_insert(entry.map(|e| e.version));

        entry
            .map(|e| Document::new(path.clone(), e.fields.clone(), e.version))
            .ok_or_else(|| StoreError::not_found(path.as_str()))
    }

    fn set(&mut self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.shared.check_write(path, &fields)?;
        self.writes.push((path.clone(), PendingWrite::Set(fields)));
        Ok(())
    }

    fn create(&mut self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.shared.check_write(path, &fields)?;
        self.writes.push((path.clone(), PendingWrite::Create(fields)));
        Ok(())
    }

    fn delete(&mut self, path: &DocumentPath) -> StoreResult<()> {
        self.writes.push((path.clone(), PendingWrite::Delete));
        Ok(())
    }

    fn write_count(&self) -> usize {
        self.writes.len()
    }
}
