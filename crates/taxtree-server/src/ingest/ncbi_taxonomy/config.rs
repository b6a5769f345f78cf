//! NCBI Taxonomy dump source configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ingest::common::ftp::FtpConnection;

/// Where and how to fetch the `new_taxdump` archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcbiTaxonomyFtpConfig {
    /// FTP server hostname
    pub ftp_host: String,
    /// FTP port (default: 21)
    pub ftp_port: u16,
    /// FTP username (default: "anonymous")
    pub ftp_username: String,
    /// FTP password (default: "anonymous")
    pub ftp_password: String,
    /// Directory holding the dump on the FTP server
    pub ftp_base_path: String,
    /// Archive file name inside `ftp_base_path`
    pub archive_name: String,
    /// Connection timeout in seconds (default: 30)
    pub connection_timeout_secs: u64,
    /// Read timeout in seconds (default: 1800 = 30 minutes)
    pub read_timeout_secs: u64,
    /// Verify the archive against the published `.md5` file
    pub verify_checksum: bool,
    /// Maximum number of node records to parse (None for unlimited).
    /// Only useful for closed subsets; a truncated node list normally leaves
    /// dangling parents and the encoder rejects it.
    pub parse_limit: Option<usize>,
}

impl Default for NcbiTaxonomyFtpConfig {
    fn default() -> Self {
        Self {
            ftp_host: "ftp.ncbi.nlm.nih.gov".to_string(),
            ftp_port: 21,
            ftp_username: "anonymous".to_string(),
            ftp_password: "anonymous".to_string(),
            ftp_base_path: "/pub/taxonomy/new_taxdump".to_string(),
            archive_name: "new_taxdump.tar.gz".to_string(),
            connection_timeout_secs: 30,
            read_timeout_secs: 1800, // the archive is well over 100 MB
            verify_checksum: true,
            parse_limit: None,
        }
    }
}

impl NcbiTaxonomyFtpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_limit(mut self, limit: usize) -> Self {
        self.parse_limit = Some(limit);
        self
    }

    pub fn with_ftp_host(mut self, host: impl Into<String>) -> Self {
        self.ftp_host = host.into();
        self
    }

    pub fn with_connection_timeout(mut self, timeout_secs: u64) -> Self {
        self.connection_timeout_secs = timeout_secs;
        self
    }

    pub fn with_read_timeout(mut self, timeout_secs: u64) -> Self {
        self.read_timeout_secs = timeout_secs;
        self
    }

    pub fn without_checksum(mut self) -> Self {
        self.verify_checksum = false;
        self
    }

    /// Full FTP path of the dump archive
    pub fn taxdump_path(&self) -> String {
        format!("{}/{}", self.ftp_base_path, self.archive_name)
    }

    /// Full FTP path of the archive's published MD5 file
    pub fn md5_path(&self) -> String {
        format!("{}.md5", self.taxdump_path())
    }

    pub fn connection(&self) -> FtpConnection {
        FtpConnection {
            host: self.ftp_host.clone(),
            port: self.ftp_port,
            username: self.ftp_username.clone(),
            password: self.ftp_password.clone(),
            connect_timeout: Duration::from_secs(self.connection_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }
}
