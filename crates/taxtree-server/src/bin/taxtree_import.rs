//! taxtree-import - NCBI Taxonomy import tool
//!
//! Usage:
//!   taxtree-import import [--force] [--archive PATH] [--source-version DATE]
//!   taxtree-import check [--archive PATH] [--anchor TAX_ID]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxtree_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::info;

use taxtree_server::{
    config::Config,
    db,
    ingest::ncbi_taxonomy::{prepare, ImportOptions, NcbiTaxonomyFtpConfig, TaxtreePipeline},
    tree::{TaxId, TreeQuery},
};

#[derive(Parser, Debug)]
#[command(name = "taxtree-import")]
#[command(author, version, about = "NCBI Taxonomy import tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Keep only the first N nodes (testing only; the subset must be closed)
    #[arg(long, global = true)]
    parse_limit: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download (or read), encode and store the taxonomy
    Import {
        /// Replace the taxonomy even if one is already loaded
        #[arg(short, long)]
        force: bool,

        /// Local new_taxdump archive (.tar.gz or .zip) instead of FTP
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Dump date to record, e.g. 2026-01-15
        #[arg(long)]
        source_version: Option<NaiveDate>,
    },

    /// Parse and encode without touching the database
    Check {
        /// Local new_taxdump archive (.tar.gz or .zip) instead of FTP
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Print the encoding and subtree summary of this taxon
        #[arg(long)]
        anchor: Option<TaxId>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("taxtree-import")
        .build()
        .with_env()?;
    let _guard = init_logging(&log_config)?;

    let mut ftp_config = NcbiTaxonomyFtpConfig::new();
    if let Some(limit) = cli.parse_limit {
        ftp_config = ftp_config.with_parse_limit(limit);
    }

    match cli.command {
        Command::Import {
            force,
            archive,
            source_version,
        } => {
            let config = Config::load()?;
            let pool = db::create_pool(&config.database).await?;
            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            let options = ImportOptions {
                force,
                archive: archive.or(config.import.archive),
                source_version,
            };

            let start = std::time::Instant::now();
            let result = TaxtreePipeline::new(ftp_config, pool).run(&options).await?;

            info!(duration_secs = format!("{:.1}", start.elapsed().as_secs_f64()), "Import finished");
            println!("{}", result.summary());
        },
        Command::Check { archive, anchor } => {
            let options = ImportOptions {
                archive,
                ..Default::default()
            };
            let prepared = prepare(&ftp_config, &options).await?;

            println!("{}", prepared.stats());
            println!(
                "tree: {} nodes, {} leaves, max depth {}",
                prepared.tree.len(),
                prepared.tree.leaf_count(),
                prepared.tree.max_depth()
            );

            if let Some(tax_id) = anchor {
                let node = prepared
                    .tree
                    .get(tax_id)
                    .with_context(|| format!("Taxon {} is not in the dump", tax_id))?;
                let e = &node.encoding;
                let children = prepared.tree.select(&TreeQuery::children(node)).len();
                let leaves = prepared.tree.select(&TreeQuery::leaves(node)).len();

                println!(
                    "taxon {}: sequence_id {}, depth {}, right_bound {}, subtree size {}, {} children, {} leaves",
                    tax_id,
                    e.sequence_id,
                    e.depth,
                    e.right_bound,
                    e.subtree_size(),
                    children,
                    leaves
                );
            }
        },
    }

    Ok(())
}
