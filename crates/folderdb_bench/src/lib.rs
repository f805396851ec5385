//! Benchmark support for folderdb.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
