//! # folderdb Testkit
//!
//! Test utilities for folderdb.
//!
//! This crate provides:
//! - Store fixtures, ephemeral or backed by a temporary directory
//! - Canned folder trees for integration tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use folderdb_testkit::prelude::*;
//!
//! with_hierarchy(|folders| {
//!     let ids = scenarios::flat_children(folders, "sports", 3);
//!     assert_eq!(ids.len(), 3);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
