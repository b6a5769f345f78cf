//! Data ingestion
//!
//! - **common**: archive extraction and FTP retry helpers
//! - **ncbi_taxonomy**: the taxdump import pipeline

pub mod common;
pub mod ncbi_taxonomy;
