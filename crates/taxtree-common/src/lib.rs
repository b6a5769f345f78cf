//! taxtree Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the taxtree workspace.
//!
//! - **Error Handling**: [`TaxtreeError`] and the [`Result`] alias
//! - **Checksums**: archive integrity verification for downloaded dumps
//! - **Logging**: the tracing subscriber setup used by every binary
//!
//! # Example
//!
//! ```no_run
//! use taxtree_common::checksum::{verify_file_checksum, ChecksumAlgorithm};
//!
//! fn check(path: &str, expected: &str) -> taxtree_common::Result<()> {
//!     verify_file_checksum(path, expected, ChecksumAlgorithm::Md5)?;
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{Result, TaxtreeError};
