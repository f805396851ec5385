//! # folderdb Core
//!
//! Folder hierarchy manager for folderdb.
//!
//! This crate provides:
//! - The [`Folder`] entity and its stored field names
//! - Nested and flat creation entry points ([`FolderHierarchy`])
//! - Atomic batch seeding bounded by the store's write limit
//! - Lazy child queries in both representations
//! - Timed draining of lazy sequences ([`drain`], [`Timed`])
//! - Divergence reports between the two representations
//!
//! A folder can be found two ways: by its `ParentID` field in the flat
//! root collection, or by listing its parent's `folders` subcollection.
//! The physical nesting is authoritative for the nested layout; the
//! `ParentID` field is a denormalized index that only the nested entry
//! point keeps in line with it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod consistency;
mod error;
mod folder;
mod hierarchy;
mod instrument;
mod seed;

pub use config::{HierarchyConfig, DEFAULT_ROOT_COLLECTION, DEFAULT_SUBCOLLECTION};
pub use consistency::ConsistencyReport;
pub use error::{BatchWriteError, CoreError, CoreResult, ErrorKind, WriteFailure};
pub use folder::{
    derive_parent_id, Folder, Metadata, StoredFolder, ID_FIELD, METADATA_FIELD, PARENT_ID_FIELD,
};
pub use hierarchy::{Descendant, FolderHierarchy, FolderIter};
pub use instrument::{drain, percentage, IterationSummary, StepStats, Timed, TimedExt};
pub use seed::{
    random_id, sports_example, BatchReport, FolderSpec, SeedLayout, SeedPlan, SeedReport,
};
