//! NCBI Taxonomy data ingestion module
//!
//! Downloads the `new_taxdump` archive from the NCBI FTP server (or reads a
//! local copy), parses the `.dmp` files, encodes the tree and replaces the
//! database contents in one transaction.
//!
//! # Example
//! ```no_run
//! use taxtree_server::ingest::ncbi_taxonomy::{ImportOptions, NcbiTaxonomyFtpConfig, TaxtreePipeline};
//!
//! # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let pipeline = TaxtreePipeline::new(NcbiTaxonomyFtpConfig::new(), pool);
//! let result = pipeline.run(&ImportOptions::default()).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ftp;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod storage;

pub use config::NcbiTaxonomyFtpConfig;
pub use ftp::{NcbiTaxonomyFtp, TaxdumpArchive, TaxdumpFiles};
pub use models::{DeletedTaxon, MergedTaxon, TaxdumpData, TaxdumpStats};
pub use parser::TaxdumpParser;
pub use pipeline::{prepare, ImportOptions, PipelineResult, PreparedImport, TaxtreePipeline};
pub use storage::{StorageStats, TaxtreeStorage};
