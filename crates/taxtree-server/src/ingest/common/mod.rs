//! Utilities shared by the ingestion code
//!
//! - **ftp**: FTP sessions with retry logic
//! - **decompression**: member extraction from tar.gz and zip archives

pub mod decompression;
pub mod ftp;
