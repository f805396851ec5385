//! # folderdb Store
//!
//! Document store abstraction for folderdb.
//!
//! This crate is the boundary between the folder hierarchy logic and the
//! document database it runs against. It knows about paths, documents,
//! transactions and lazy sequences, but nothing about folders.
//!
//! ## Design Principles
//!
//! - Collections and documents alternate along a `/`-separated path
//! - Transactions are all-or-nothing and bounded in write count
//! - Queries and listings never cross into nested subcollections
//! - Every failure is a typed [`StoreError`]; nothing panics or exits
//!
//! ## Available Stores
//!
//! - [`LocalStore`] - In-process emulator, ephemeral or persisted to a directory
//!
//! ## Example
//!
//! ```rust
//! use folderdb_store::{
//!     CollectionPath, DocumentPath, DocumentStore, Fields, LocalStore, Transaction,
//! };
//!
//! let store = LocalStore::in_memory().unwrap();
//! store
//!     .run_transaction(&mut |tx: &mut dyn Transaction| {
//!         tx.set(&DocumentPath::new("folders/sports")?, Fields::new())?;
//!         tx.set(&DocumentPath::new("folders/sports/folders/hockey")?, Fields::new())?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let children = CollectionPath::new("folders/sports/folders").unwrap();
//! assert_eq!(store.list_children(&children).unwrap().count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod error;
mod local;
mod path;
mod store;

pub use config::{
    Endpoint, StoreConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WRITES, DEFAULT_PAGE_SIZE,
};
pub use document::{
    encoded_size, from_fields, to_fields, Document, FieldFilter, Fields, Value, MAX_DOCUMENT_SIZE,
};
pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, LocalTransaction, PendingWrite};
pub use path::{validate_segment, CollectionPath, DocumentPath, SEPARATOR};
pub use store::{CommitInfo, DocumentIter, DocumentStore, Transaction, TransactionFn};
