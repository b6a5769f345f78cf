//! NCBI Taxonomy dump acquisition
//!
//! Fetches `new_taxdump.tar.gz` over FTP (or reads a local archive), checks it
//! against the published MD5 and extracts the five `.dmp` files the import
//! needs.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use taxtree_common::checksum::{
    compute_bytes_checksum, parse_checksum_listing, verify_bytes_checksum, ChecksumAlgorithm,
};

use super::config::NcbiTaxonomyFtpConfig;
use crate::ingest::common::decompression::{extract_members, ArchiveFormat};
use crate::ingest::common::ftp::with_retries;

pub const NODES_FILE: &str = "nodes.dmp";
pub const NAMES_FILE: &str = "names.dmp";
pub const RANKED_LINEAGE_FILE: &str = "rankedlineage.dmp";
pub const MERGED_FILE: &str = "merged.dmp";
pub const DELNODES_FILE: &str = "delnodes.dmp";

const TAXDUMP_MEMBERS: [&str; 5] = [
    NODES_FILE,
    NAMES_FILE,
    RANKED_LINEAGE_FILE,
    MERGED_FILE,
    DELNODES_FILE,
];

/// A downloaded (or locally read) dump archive
#[derive(Debug, Clone)]
pub struct TaxdumpArchive {
    pub data: Vec<u8>,
    pub format: ArchiveFormat,
    /// Dump date from the server's modification time, when downloaded
    pub modified: Option<NaiveDate>,
    pub md5: String,
}

impl TaxdumpArchive {
    /// Read an archive from disk; the format comes from the extension,
    /// falling back to the file's magic bytes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read archive {}", path.display()))?;

        let format = ArchiveFormat::from_path(&path.to_string_lossy())
            .or_else(|| ArchiveFormat::sniff(&data))
            .with_context(|| format!("{} is neither a tar.gz nor a zip archive", path.display()))?;

        info!("Read local archive {} ({} bytes, {:?})", path.display(), data.len(), format);
        Ok(Self {
            md5: compute_bytes_checksum(&data, ChecksumAlgorithm::Md5),
            data,
            format,
            modified: None,
        })
    }

    pub fn extract(&self) -> Result<TaxdumpFiles> {
        let members = extract_members(&self.data, self.format, &TAXDUMP_MEMBERS)?;
        TaxdumpFiles::from_members(members)
    }
}

/// Contents of the `.dmp` files used by an import
#[derive(Debug, Clone, Default)]
pub struct TaxdumpFiles {
    pub nodes: String,
    pub names: String,
    pub rankedlineage: String,
    pub merged: String,
    pub delnodes: String,
}

impl TaxdumpFiles {
    fn from_members(mut members: HashMap<String, Vec<u8>>) -> Result<Self> {
        let mut take = |name: &str| -> Result<String> {
            let bytes = members
                .remove(name)
                .with_context(|| format!("{} not found in archive", name))?;
            // names.dmp has carried the odd Latin-1 byte in the past
            Ok(String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
        };

        Ok(Self {
            nodes: take(NODES_FILE)?,
            names: take(NAMES_FILE)?,
            rankedlineage: take(RANKED_LINEAGE_FILE)?,
            merged: take(MERGED_FILE)?,
            delnodes: take(DELNODES_FILE)?,
        })
    }
}

/// FTP client for the NCBI Taxonomy dump
pub struct NcbiTaxonomyFtp {
    config: NcbiTaxonomyFtpConfig,
}

impl NcbiTaxonomyFtp {
    pub fn new(config: NcbiTaxonomyFtpConfig) -> Self {
        Self { config }
    }

    /// Download the current dump archive and verify its checksum
    #[tracing::instrument(skip(self), fields(host = %self.config.ftp_host))]
    pub async fn download_taxdump(&self) -> Result<TaxdumpArchive> {
        let path = self.config.taxdump_path();
        info!("Downloading taxdump from: {}", path);

        let connection = self.config.connection();
        let (data, modified) = with_retries(&format!("download {}", path), {
            let path = path.clone();
            move || {
                let mut ftp = connection.open()?;

                let timestamp = ftp
                    .mdtm(&path)
                    .context("Failed to get file modification time")?;
                let modified =
                    NaiveDate::from_ymd_opt(timestamp.year(), timestamp.month(), timestamp.day())
                        .context("Server returned an invalid modification time")?;

                let data = ftp
                    .retr_as_buffer(&path)
                    .with_context(|| format!("Failed to download file: {}", path))?
                    .into_inner();
                let _ = ftp.quit();

                Ok((data, modified))
            }
        })
        .await?;

        info!("Downloaded taxdump version {} ({} bytes)", modified, data.len());

        let md5 = compute_bytes_checksum(&data, ChecksumAlgorithm::Md5);
        if self.config.verify_checksum {
            let expected = self.published_md5().await?;
            verify_bytes_checksum(&self.config.archive_name, &data, &expected, ChecksumAlgorithm::Md5)?;
            info!(md5 = %md5, "Archive checksum verified");
        } else {
            debug!(md5 = %md5, "Checksum verification disabled");
        }

        Ok(TaxdumpArchive {
            data,
            format: ArchiveFormat::TarGz,
            modified: Some(modified),
            md5,
        })
    }

    /// Fetch and parse the `.md5` file published next to the archive
    async fn published_md5(&self) -> Result<String> {
        let path = self.config.md5_path();
        let connection = self.config.connection();

        let listing = with_retries(&format!("download {}", path), {
            let path = path.clone();
            move || {
                let mut ftp = connection.open()?;
                let data = ftp
                    .retr_as_buffer(&path)
                    .with_context(|| format!("Failed to download file: {}", path))?
                    .into_inner();
                let _ = ftp.quit();
                String::from_utf8(data).context("Checksum file is not UTF-8")
            }
        })
        .await?;

        Ok(parse_checksum_listing(&listing, &self.config.archive_name)?)
    }
}
