//! NCBI Taxonomy ingestion pipeline
//!
//! Orchestrates the full import: acquire the dump (FTP or a local archive),
//! parse it, encode the tree, and replace the database contents.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use std::path::PathBuf;
use tracing::{info, warn};

use super::config::NcbiTaxonomyFtpConfig;
use super::ftp::{NcbiTaxonomyFtp, TaxdumpArchive};
use super::models::{TaxdumpData, TaxdumpStats};
use super::parser::TaxdumpParser;
use super::storage::{StorageStats, TaxtreeStorage};
use crate::db::taxa::is_populated;
use crate::tree::{encode, EncodedTree};

/// Options for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Replace the data even when a taxonomy is already loaded
    pub force: bool,
    /// Read this archive instead of downloading from FTP
    pub archive: Option<PathBuf>,
    /// Overrides the dump date taken from the FTP server
    pub source_version: Option<NaiveDate>,
}

/// Result of an import without touching the database
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub data: TaxdumpData,
    pub tree: EncodedTree,
}

impl PreparedImport {
    pub fn stats(&self) -> TaxdumpStats {
        self.data.stats()
    }
}

/// NCBI Taxonomy ingestion pipeline
pub struct TaxtreePipeline {
    config: NcbiTaxonomyFtpConfig,
    db: PgPool,
}

impl TaxtreePipeline {
    pub fn new(config: NcbiTaxonomyFtpConfig, db: PgPool) -> Self {
        Self { config, db }
    }

    /// Run the full ingestion pipeline
    ///
    /// Steps:
    /// 1. Skip if a taxonomy is already loaded (unless forced)
    /// 2. Acquire the dump archive
    /// 3. Parse and encode
    /// 4. Replace the database contents
    pub async fn run(&self, options: &ImportOptions) -> Result<PipelineResult> {
        let started_at = Utc::now();

        if !options.force
            && is_populated(&self.db)
                .await
                .context("Failed to check existing taxonomy")?
        {
            info!("Taxonomy already loaded, skipping import");
            return Ok(PipelineResult::skipped());
        }

        let prepared = prepare(&self.config, options).await?;

        info!("Storing to database");
        let storage = TaxtreeStorage::new(self.db.clone());
        let storage_stats = storage
            .replace_all(&prepared.data, &prepared.tree, started_at)
            .await
            .context("Failed to store taxonomy")?;

        info!(
            source_version = %prepared.data.source_version,
            import_id = storage_stats.import_id,
            nodes = storage_stats.nodes,
            "NCBI Taxonomy import completed successfully"
        );

        Ok(PipelineResult {
            source_version: Some(prepared.data.source_version),
            max_depth: Some(prepared.tree.max_depth()),
            storage_stats: Some(storage_stats),
            skipped: false,
        })
    }
}

/// Acquire, parse and encode a dump. No database access.
pub async fn prepare(
    config: &NcbiTaxonomyFtpConfig,
    options: &ImportOptions,
) -> Result<PreparedImport> {
    info!("Phase 1: Acquiring taxdump archive");
    let archive = match &options.archive {
        Some(path) => {
            let path = path.clone();
            tokio::task::spawn_blocking(move || TaxdumpArchive::from_path(path))
                .await
                .context("Archive read task panicked")??
        },
        None => NcbiTaxonomyFtp::new(config.clone())
            .download_taxdump()
            .await
            .context("Failed to download taxdump")?,
    };

    let source_version = options
        .source_version
        .or(archive.modified)
        .unwrap_or_else(|| {
            let today = Utc::now().date_naive();
            warn!(%today, "No dump date available, using today's date");
            today
        });

    info!("Phase 2: Parsing taxdump files");
    let parser = match config.parse_limit {
        Some(limit) => {
            warn!(limit, "Parse limit is set, will only process {} nodes", limit);
            TaxdumpParser::with_limit(limit)
        },
        None => TaxdumpParser::new(),
    };

    let (data, tree) = tokio::task::spawn_blocking(move || -> Result<_> {
        let files = archive.extract().context("Failed to extract taxdump archive")?;
        let data = parser
            .parse(&files, source_version, Some(archive.md5.clone()))
            .context("Failed to parse taxdump")?;
        info!(stats = %data.stats(), "Parsed taxdump");

        let tree = encode(&data.edges()).context("Taxonomy tree is not well formed")?;
        info!(
            nodes = tree.len(),
            leaves = tree.leaf_count(),
            max_depth = tree.max_depth(),
            "Encoded taxonomy tree"
        );
        Ok((data, tree))
    })
    .await
    .context("Encoding task panicked")??;

    Ok(PreparedImport { data, tree })
}

/// Result of running the pipeline
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Dump date that was imported (None if skipped)
    pub source_version: Option<NaiveDate>,
    pub max_depth: Option<i32>,
    /// Storage statistics (None if skipped)
    pub storage_stats: Option<StorageStats>,
    /// Whether the import was skipped because data already exists
    pub skipped: bool,
}

impl PipelineResult {
    fn skipped() -> Self {
        Self {
            source_version: None,
            max_depth: None,
            storage_stats: None,
            skipped: true,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.skipped && self.storage_stats.is_some()
    }

    pub fn summary(&self) -> String {
        if self.skipped {
            "Import skipped - taxonomy already loaded (use --force to replace)".to_string()
        } else if let (Some(version), Some(stats)) = (&self.source_version, &self.storage_stats) {
            format!(
                "Imported taxonomy {} as import #{} ({} nodes, {} names, {} lineages, {} merged, {} deleted)",
                version, stats.import_id, stats.nodes, stats.names, stats.lineages, stats.merged, stats.deleted
            )
        } else {
            "Import failed".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::common::decompression::tests::tar_gz;
    use std::io::Write;

    const NODES: &str = "1\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t0\t|\t1\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n\
                         2\t|\t1\t|\tdomain\t|\t\t|\t0\t|\t0\t|\t11\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n\
                         9\t|\t2\t|\tspecies\t|\tBA\t|\t0\t|\t1\t|\t11\t|\t1\t|\t0\t|\t1\t|\t0\t|\t0\t|\t\t|\n";
    const NAMES: &str = "1\t|\troot\t|\t\t|\tscientific name\t|\n\
                         2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|\n";

    fn write_archive(nodes: &str, names: &str) -> tempfile::NamedTempFile {
        let data = tar_gz(&[
            ("new_taxdump/nodes.dmp", nodes),
            ("new_taxdump/names.dmp", names),
            ("new_taxdump/rankedlineage.dmp", ""),
            ("new_taxdump/merged.dmp", "12\t|\t9\t|\n"),
            ("new_taxdump/delnodes.dmp", "42\t|\n"),
        ]);
        let mut file = tempfile::Builder::new().suffix(".tar.gz").tempfile().unwrap();
        file.write_all(&data).unwrap();
        file
    }

    #[tokio::test]
    async fn test_prepare_local_archive() {
        let file = write_archive(NODES, NAMES);
        let options = ImportOptions {
            archive: Some(file.path().to_path_buf()),
            source_version: NaiveDate::from_ymd_opt(2026, 1, 15),
            ..Default::default()
        };

        let prepared = prepare(&NcbiTaxonomyFtpConfig::new(), &options).await.unwrap();
        let stats = prepared.stats();
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.names, 2);
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(prepared.data.source_version.to_string(), "2026-01-15");
        assert_eq!(prepared.data.archive_md5.as_ref().map(String::len), Some(32));

        assert_eq!(prepared.tree.max_depth(), 3);
        assert_eq!(prepared.tree.get(9).unwrap().encoding.sequence_id, 3);
    }

    #[tokio::test]
    async fn test_prepare_rejects_dangling_parent() {
        let nodes = format!("{}77\t|\t76\t|\tgenus\t|\t\t|\t0\t|\t0\t|\t11\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n", NODES);
        let file = write_archive(&nodes, NAMES);
        let options = ImportOptions {
            archive: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let err = prepare(&NcbiTaxonomyFtpConfig::new(), &options).await.unwrap_err();
        assert!(format!("{:#}", err).contains("parent 76"));
    }

    fn local(file: &tempfile::NamedTempFile) -> ImportOptions {
        ImportOptions {
            archive: Some(file.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_rejects_malformed_leaf() {
        // taxon 9 is a leaf, so its loss would leave no dangling parent behind
        let nodes = NODES.replace("9\t|\t2\t|\tspecies\t|\tBA\t|\t0", "9\t|\t2\t|\tspecies\t|\tBA\t|\tX");
        assert_ne!(nodes, NODES);
        let file = write_archive(&nodes, NAMES);

        let err = prepare(&NcbiTaxonomyFtpConfig::new(), &local(&file)).await.unwrap_err();
        assert!(format!("{:#}", err).contains("nodes.dmp line 3"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_name_of_unknown_taxon() {
        let names = format!("{}9999\t|\tghost\t|\t\t|\tsynonym\t|\n", NAMES);
        let file = write_archive(NODES, &names);

        let err = prepare(&NcbiTaxonomyFtpConfig::new(), &local(&file)).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("names.dmp"), "{}", message);
        assert!(message.contains("9999"), "{}", message);
    }

    #[test]
    fn test_summary() {
        assert!(PipelineResult::skipped().summary().contains("skipped"));
        assert!(!PipelineResult::skipped().is_success());

        let result = PipelineResult {
            source_version: NaiveDate::from_ymd_opt(2026, 1, 15),
            max_depth: Some(3),
            storage_stats: Some(StorageStats {
                import_id: 4,
                nodes: 3,
                names: 2,
                lineages: 0,
                merged: 1,
                deleted: 1,
            }),
            skipped: false,
        };
        assert!(result.is_success());
        assert_eq!(
            result.summary(),
            "Imported taxonomy 2026-01-15 as import #4 (3 nodes, 2 names, 0 lineages, 1 merged, 1 deleted)"
        );
    }
}
