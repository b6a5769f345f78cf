//! Archive extraction for downloaded dumps
//!
//! The published dump is a `.tar.gz`; older and locally mirrored copies are
//! `.zip`. Both are read fully in memory and only the requested members are
//! kept, matched on their base name.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Guess the format from a file name
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Guess the format from the leading magic bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&GZIP_MAGIC) {
            Some(Self::TarGz)
        } else if data.starts_with(&ZIP_MAGIC) {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Extract the named members from an archive.
///
/// Fails if any requested member is missing.
pub fn extract_members(
    data: &[u8],
    format: ArchiveFormat,
    members: &[&str],
) -> Result<HashMap<String, Vec<u8>>> {
    let extracted = match format {
        ArchiveFormat::TarGz => extract_tar_gz(data, members)?,
        ArchiveFormat::Zip => extract_zip(data, members)?,
    };

    let missing: Vec<&str> = members
        .iter()
        .copied()
        .filter(|m| !extracted.contains_key(*m))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("Missing files in {:?} archive: {:?}", format, missing);
    }

    Ok(extracted)
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extract_tar_gz(data: &[u8], members: &[&str]) -> Result<HashMap<String, Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(data));
    let mut result = HashMap::new();

    for entry in archive.entries().context("Failed to read tar archive")? {
        let mut entry = entry.context("Failed to read tar entry")?;
        let path = entry
            .path()
            .context("Failed to get entry path")?
            .to_string_lossy()
            .into_owned();
        let name = base_name(&path);

        if !members.contains(&name) {
            debug!("Skipping file: {}", name);
            continue;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .with_context(|| format!("Failed to read {}", name))?;
        debug!("Extracted {} ({} bytes)", name, contents.len());
        result.insert(name.to_string(), contents);

        if result.len() == members.len() {
            break;
        }
    }

    Ok(result)
}

fn extract_zip(data: &[u8], members: &[&str]) -> Result<HashMap<String, Vec<u8>>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).context("Failed to open zip archive")?;
    let mut result = HashMap::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry at index {}", i))?;
        if file.is_dir() {
            continue;
        }

        let path = file.name().to_string();
        let name = base_name(&path);
        if !members.contains(&name) {
            debug!("Skipping file: {}", name);
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .with_context(|| format!("Failed to read {}", name))?;
        debug!("Extracted {} ({} bytes)", name, contents.len());
        result.insert(name.to_string(), contents);
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    pub(crate) fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, body) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    pub(crate) fn zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ArchiveFormat::from_path("new_taxdump.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path("/tmp/DUMP.ZIP"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("nodes.dmp"), None);

        assert_eq!(ArchiveFormat::sniff(&tar_gz(&[("a", "b")])), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::sniff(&zip(&[("a", "b")])), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::sniff(b"plain text"), None);
    }

    #[test]
    fn test_extract_tar_gz_members() {
        let data = tar_gz(&[
            ("new_taxdump/nodes.dmp", "1\t|\t1\t|"),
            ("new_taxdump/citations.dmp", "ignored"),
            ("new_taxdump/names.dmp", "1\t|\troot\t|"),
        ]);

        let files = extract_members(&data, ArchiveFormat::TarGz, &["nodes.dmp", "names.dmp"]).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["nodes.dmp"], b"1\t|\t1\t|");
    }

    #[test]
    fn test_extract_zip_members() {
        let data = zip(&[("delnodes.dmp", "42\t|"), ("merged.dmp", "12\t|\t7\t|")]);

        let files = extract_members(&data, ArchiveFormat::Zip, &["delnodes.dmp"]).unwrap();
        assert_eq!(files["delnodes.dmp"], b"42\t|");
        assert!(!files.contains_key("merged.dmp"));
    }

    #[test]
    fn test_missing_member_is_an_error() {
        let data = tar_gz(&[("nodes.dmp", "")]);
        let err = extract_members(&data, ArchiveFormat::TarGz, &["nodes.dmp", "names.dmp"])
            .unwrap_err();
        assert!(err.to_string().contains("names.dmp"));
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        assert!(extract_members(b"PK\x03\x04garbage", ArchiveFormat::Zip, &["x"]).is_err());
    }
}
