//! Collection and document paths.
//!
//! Paths alternate between collection and document segments:
//!
//! ```text
//! folders                         collection (1 segment)
//! folders/sports                  document   (2 segments)
//! folders/sports/folders          collection (3 segments)
//! folders/sports/folders/hockey   document   (4 segments)
//! ```
//!
//! Every segment is non-empty and never contains `/`.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;

/// Path separator.
pub const SEPARATOR: char = '/';

/// Checks that `segment` can be used as a single path segment.
///
/// # Errors
///
/// Returns `InvalidPath` if the segment is empty, contains `/`,
/// or is one of the reserved names `.` and `..`.
pub fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path(segment, "empty segment"));
    }
    if segment.contains(SEPARATOR) {
        return Err(StoreError::invalid_path(segment, "segment contains '/'"));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::invalid_path(segment, "reserved segment"));
    }
    Ok(())
}

fn validate_path(path: &str, want_odd: bool) -> StoreResult<()> {
    let mut count = 0usize;
    for segment in path.split(SEPARATOR) {
        validate_segment(segment).map_err(|_| {
            StoreError::invalid_path(path, format!("bad segment {segment:?}"))
        })?;
        count += 1;
    }
    let is_odd = count % 2 == 1;
    if is_odd != want_odd {
        let kind = if want_odd { "collection" } else { "document" };
        return Err(StoreError::invalid_path(
            path,
            format!("{count} segments is not a {kind} path"),
        ));
    }
    Ok(())
}

/// Path of a collection (odd number of segments).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parses and validates a collection path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the path is malformed or names a document.
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        validate_path(&path, true)?;
        Ok(Self(path))
    }

    /// Returns the collection path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the collection's own name (its last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Returns the document that owns this collection, or `None` for a
    /// root-level collection.
    #[must_use]
    pub fn parent(&self) -> Option<DocumentPath> {
        self.0
            .rfind(SEPARATOR)
            .map(|idx| DocumentPath(self.0[..idx].to_string()))
    }

    /// Returns the path of the document `id` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if `id` is not a valid segment.
    pub fn doc(&self, id: &str) -> StoreResult<DocumentPath> {
        validate_segment(id)?;
        Ok(DocumentPath(format!("{}{SEPARATOR}{id}", self.0)))
    }

    /// Returns true if `doc` is stored directly in this collection.
    #[must_use]
    pub fn contains(&self, doc: &DocumentPath) -> bool {
        doc.0
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .is_some_and(|id| !id.contains(SEPARATOR))
    }

    /// Prefix shared by every document beneath this collection.
    pub(crate) fn child_prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.0)
    }
}

/// Path of a document (even number of segments).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Parses and validates a document path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the path is malformed or names a collection.
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        validate_path(&path, false)?;
        Ok(Self(path))
    }

    /// Wraps a path already known to be valid.
    pub(crate) fn from_trusted(path: String) -> Self {
        Self(path)
    }

    /// Returns the document path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the document identifier (the last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Returns the collection containing this document.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        // A document path always has at least two segments.
        let idx = self.0.rfind(SEPARATOR).unwrap_or(0);
        CollectionPath(self.0[..idx].to_string())
    }

    /// Returns the document owning this document's collection, if any.
    #[must_use]
    pub fn grandparent(&self) -> Option<DocumentPath> {
        self.parent().parent()
    }

    /// Returns the subcollection `name` beneath this document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if `name` is not a valid segment.
    pub fn collection(&self, name: &str) -> StoreResult<CollectionPath> {
        validate_segment(name)?;
        Ok(CollectionPath(format!("{}{SEPARATOR}{name}", self.0)))
    }

    /// Returns the nesting depth: 0 for a document in a root collection.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count() / 2
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CollectionPath {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::new(s)
    }
}

impl FromStr for DocumentPath {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::new(s)
    }
}
