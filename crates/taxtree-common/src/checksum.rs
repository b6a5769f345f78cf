//! Checksum utilities for verifying downloaded dump archives
//!
//! NCBI publishes an `.md5` sidecar next to each taxdump archive in the
//! `md5sum` output format (`<hex digest>  <file name>`).

use crate::error::{Result, TaxtreeError};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut buffer = [0u8; 8192];

    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }
            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(hex::encode(hasher.finalize()))
        },
    }
}

/// Compute checksum of an in-memory buffer
pub fn compute_bytes_checksum(data: &[u8], algorithm: ChecksumAlgorithm) -> String {
    match algorithm {
        ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(data)),
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    }
}

pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Verify a file against an expected hex digest (case-insensitive)
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<()> {
    let path = path.as_ref();
    let actual = compute_file_checksum(path, algorithm)?;
    check_digest(&path.display().to_string(), expected, actual)
}

/// Verify an in-memory buffer against an expected hex digest
pub fn verify_bytes_checksum(
    name: &str,
    data: &[u8],
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<()> {
    check_digest(name, expected, compute_bytes_checksum(data, algorithm))
}

fn check_digest(file: &str, expected: &str, actual: String) -> Result<()> {
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(TaxtreeError::ChecksumMismatch {
            file: file.to_string(),
            expected: expected.trim().to_string(),
            actual,
        })
    }
}

/// Extract the digest for `file_name` from an `md5sum`-style listing.
///
/// A listing with a single line and no file name column is accepted as the
/// digest of whatever file it accompanies.
pub fn parse_checksum_listing(listing: &str, file_name: &str) -> Result<String> {
    let lines = listing.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut single = None;
    let mut count = 0;

    for line in lines {
        count += 1;
        let mut parts = line.split_whitespace();
        let digest = match parts.next() {
            Some(d) => d,
            None => continue,
        };
        match parts.next() {
            // md5sum prefixes binary-mode names with '*'
            Some(name) if name.trim_start_matches('*') == file_name => {
                return validate_hex(digest);
            },
            Some(_) => {},
            None => single = Some(digest),
        }
    }

    match single {
        Some(digest) if count == 1 => validate_hex(digest),
        _ => Err(TaxtreeError::MalformedChecksum(format!(
            "no digest listed for {}",
            file_name
        ))),
    }
}

fn validate_hex(digest: &str) -> Result<String> {
    if !digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(digest.to_ascii_lowercase())
    } else {
        Err(TaxtreeError::MalformedChecksum(format!("not a hex digest: {}", digest)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_compute_checksum_md5() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(compute_bytes_checksum(b"hello world", ChecksumAlgorithm::Md5), checksum);
    }

    #[test]
    fn test_compute_checksum_sha256() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_verify_file_checksum() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        verify_file_checksum(file.path(), "5EB63BBBE01EEED093CB22BB8F5ACDC3", ChecksumAlgorithm::Md5)
            .unwrap();

        let err = verify_file_checksum(file.path(), "00", ChecksumAlgorithm::Md5).unwrap_err();
        assert!(matches!(err, TaxtreeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_parse_checksum_listing() {
        let listing = "5eb63bbbe01eeed093cb22bb8f5acdc3  new_taxdump.tar.gz\n";
        assert_eq!(
            parse_checksum_listing(listing, "new_taxdump.tar.gz").unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );

        let bare = "5EB63BBBE01EEED093CB22BB8F5ACDC3\n";
        assert_eq!(
            parse_checksum_listing(bare, "anything").unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );

        assert!(parse_checksum_listing("abc  other.tar.gz", "new_taxdump.tar.gz").is_err());
        assert!(parse_checksum_listing("zzzz", "x").is_err());
    }
}
