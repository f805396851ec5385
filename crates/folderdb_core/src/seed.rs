//! Folder creation requests and seeding plans.

use crate::config::HierarchyConfig;
use crate::error::CoreResult;
use crate::folder::{Folder, Metadata};
use folderdb_store::{CollectionPath, CommitInfo, DocumentPath};
use std::time::Duration;
use uuid::Uuid;

/// A folder to create, through one of the two entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSpec {
    /// Nested entry point: the document is written at `path` and its
    /// `ParentID` is derived from the path.
    Nested {
        /// Full document path of the folder.
        path: DocumentPath,
        /// Optional metadata.
        metadata: Option<Metadata>,
    },
    /// Flat entry point: the document is written to the root collection
    /// with exactly the supplied `ParentID`.
    Flat {
        /// Folder to write as given.
        folder: Folder,
    },
}

impl FolderSpec {
    /// Creates a nested-entry request.
    #[must_use]
    pub fn nested(path: DocumentPath) -> Self {
        Self::Nested {
            path,
            metadata: None,
        }
    }

    /// Creates a flat-entry request.
    #[must_use]
    pub fn flat(folder: Folder) -> Self {
        Self::Flat { folder }
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            Self::Nested { path, metadata } => {
                let mut metadata = metadata.unwrap_or_default();
                metadata.insert(key.into(), value.into());
                Self::Nested {
                    path,
                    metadata: Some(metadata),
                }
            }
            Self::Flat { folder } => Self::Flat {
                folder: folder.with_metadata(key, value),
            },
        }
    }
}

/// Generates a random folder identifier.
#[must_use]
pub fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Where randomly generated folders are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedLayout {
    /// Root collection documents carrying `parent_id` in `ParentID`.
    Flat {
        /// Logical parent written into every folder.
        parent_id: String,
    },
    /// Documents inside `parent`'s subcollection, or root folders when
    /// `parent` is `None`.
    Nested {
        /// Physical parent folder.
        parent: Option<DocumentPath>,
    },
}

/// A request to seed randomly named folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    /// Where the folders go.
    pub layout: SeedLayout,
    /// Number of folders.
    pub count: usize,
    /// Folders per transaction; defaults to the store's write limit.
    pub batch_size: Option<usize>,
    /// Metadata copied into every folder.
    pub metadata: Option<Metadata>,
}

impl SeedPlan {
    /// Seeds `count` flat folders with `ParentID == parent_id`.
    pub fn flat(parent_id: impl Into<String>, count: usize) -> Self {
        Self {
            layout: SeedLayout::Flat {
                parent_id: parent_id.into(),
            },
            count,
            batch_size: None,
            metadata: None,
        }
    }

    /// Seeds `count` folders nested under `parent`.
    #[must_use]
    pub fn nested(parent: Option<DocumentPath>, count: usize) -> Self {
        Self {
            layout: SeedLayout::Nested { parent },
            count,
            batch_size: None,
            metadata: None,
        }
    }

    /// Sets the number of folders per transaction.
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets metadata copied into every folder.
    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builds one spec per folder with fresh random identifiers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if the nested parent's subcollection name
    /// is not a valid path segment.
    pub fn specs(&self, config: &HierarchyConfig) -> CoreResult<Vec<FolderSpec>> {
        let mut specs = Vec::with_capacity(self.count);
        match &self.layout {
            SeedLayout::Flat { parent_id } => {
                for _ in 0..self.count {
                    let mut folder = Folder::new(random_id(), parent_id.as_str());
                    folder.metadata = self.metadata.clone();
                    specs.push(FolderSpec::flat(folder));
                }
            }
            SeedLayout::Nested { parent } => {
                let collection = match parent {
                    Some(parent) => parent.collection(&config.subcollection)?,
                    None => CollectionPath::new(config.root_collection.as_str())?,
                };
                for _ in 0..self.count {
                    specs.push(FolderSpec::Nested {
                        path: collection.doc(&random_id())?,
                        metadata: self.metadata.clone(),
                    });
                }
            }
        }
        Ok(specs)
    }
}

/// Outcome of one committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Paths written, in staging order.
    pub paths: Vec<DocumentPath>,
    /// Commit details from the store.
    pub commit: CommitInfo,
}

/// Outcome of a [`SeedPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Paths of every folder written.
    pub paths: Vec<DocumentPath>,
    /// Number of committed transactions.
    pub batches: usize,
    /// Wall-clock time of the whole seed.
    pub elapsed: Duration,
}

impl SeedReport {
    /// Identifiers of every folder written.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(DocumentPath::id)
    }
}

/// The classic demo tree: `sports` with nested `hockey` and `baseball`.
///
/// # Errors
///
/// Returns `InvalidFolder` if the configured collection names are invalid.
pub fn sports_example(config: &HierarchyConfig) -> CoreResult<Vec<FolderSpec>> {
    let sports = CollectionPath::new(config.root_collection.as_str())?.doc("sports")?;
    let children = sports.collection(&config.subcollection)?;
    Ok(vec![
        FolderSpec::nested(sports),
        FolderSpec::nested(children.doc("hockey")?),
        FolderSpec::nested(children.doc("baseball")?),
    ])
}
