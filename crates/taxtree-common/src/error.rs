//! Error types shared by the taxtree crates

use thiserror::Error;

/// Result type alias for taxtree operations
pub type Result<T> = std::result::Result<T, TaxtreeError>;

#[derive(Error, Debug)]
pub enum TaxtreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// The published checksum listing did not contain a usable digest
    #[error("Malformed checksum listing: {0}")]
    MalformedChecksum(String),
}
