//! Paged lazy iteration over one collection.

use super::Shared;
use crate::document::{Document, FieldFilter};
use crate::error::StoreResult;
use crate::path::{CollectionPath, DocumentPath, SEPARATOR};
use std::collections::VecDeque;
use std::ops::Bound;
use std::time::Instant;
use tracing::trace;

/// Lazy sequence over the direct children of a collection.
///
/// Documents are fetched a page at a time under a short read lock; the
/// next page resumes after the last key examined. Documents committed
/// while the sequence is being drained may or may not be observed, but a
/// document present for the whole drain is yielded exactly once.
///
/// The store deadline bounds each page fetch on its own; time the
/// consumer spends between pages does not count against it.
pub(crate) struct PagedIter<'a> {
    shared: &'a Shared,
    collection: String,
    prefix: String,
    filter: Option<FieldFilter>,
    cursor: Option<String>,
    buffer: VecDeque<Document>,
    pages: usize,
    done: bool,
}

impl<'a> PagedIter<'a> {
    pub fn new(
        shared: &'a Shared,
        collection: &CollectionPath,
        filter: Option<FieldFilter>,
    ) -> Self {
        Self {
            shared,
            collection: collection.to_string(),
            prefix: collection.child_prefix(),
            filter,
            cursor: None,
            buffer: VecDeque::new(),
            pages: 0,
            done: false,
        }
    }

    fn fetch_page(&mut self) -> StoreResult<()> {
        let started = Instant::now();
        self.shared.check_deadline(started, "iteration")?;

        let page_size = self.shared.config.page_size;
        let state = self.shared.state.read();
        let start = match self.cursor.take() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Included(self.prefix.clone()),
        };

        let mut last_key = None;
        let mut page_full = false;
        for (key, entry) in state.docs.range::<String, _>((start, Bound::Unbounded)) {
            let Some(rest) = key.strip_prefix(self.prefix.as_str()) else {
                break;
            };
            last_key = Some(key);
            if rest.contains(SEPARATOR) {
                continue;
            }
            if let Some(filter) = &self.filter {
                if !filter.matches(&entry.fields) {
                    continue;
                }
            }
            self.buffer.push_back(Document::new(
                DocumentPath::from_trusted(key.clone()),
                entry.fields.clone(),
                entry.version,
            ));
            if self.buffer.len() >= page_size {
                page_full = true;
                break;
            }
        }

        let next_cursor = if page_full { last_key.cloned() } else { None };
        drop(state);
        if let Err(err) = self.shared.check_deadline(started, "iteration") {
            self.buffer.clear();
            return Err(err);
        }

        self.pages += 1;
        trace!(
            collection = %self.collection,
            page = self.pages,
            fetched = self.buffer.len(),
            "fetched page"
        );

        if next_cursor.is_some() {
            self.cursor = next_cursor;
        } else {
            self.done = true;
        }
        Ok(())
    }
}

impl Iterator for PagedIter<'_> {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.buffer.pop_front() {
                return Some(Ok(doc));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}
