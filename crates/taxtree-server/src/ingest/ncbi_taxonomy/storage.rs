//! Storage layer for NCBI Taxonomy data
//!
//! An import replaces every taxonomy table in one transaction: truncate,
//! then chunked multi-row inserts, then the import record. A failure at any
//! point rolls the whole replacement back.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

use super::models::{LineageRecord, NameRecord, NodeRecord, TaxdumpData};
use crate::tree::{EncodedNode, EncodedTree};

/// PostgreSQL accepts at most this many bind parameters per statement
const BIND_LIMIT: usize = 65_535;

const NODE_COLUMNS: usize = 23;
const NAME_COLUMNS: usize = 4;
const LINEAGE_COLUMNS: usize = 10;

fn rows_per_statement(columns: usize) -> usize {
    BIND_LIMIT / columns
}

/// Row counts written by one import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub import_id: i64,
    pub nodes: usize,
    pub names: usize,
    pub lineages: usize,
    pub merged: usize,
    pub deleted: usize,
}

/// Writes a parsed, encoded dump to PostgreSQL
pub struct TaxtreeStorage {
    db: PgPool,
}

impl TaxtreeStorage {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Replace all taxonomy tables with `data`, using `tree` for the
    /// encoding columns.
    #[tracing::instrument(skip_all, fields(nodes = data.nodes.len(), version = %data.source_version))]
    pub async fn replace_all(
        &self,
        data: &TaxdumpData,
        tree: &EncodedTree,
        started_at: DateTime<Utc>,
    ) -> Result<StorageStats> {
        let nodes: Vec<(&NodeRecord, &EncodedNode)> = data
            .nodes
            .iter()
            .map(|n| {
                tree.get(n.tax_id)
                    .map(|e| (n, e))
                    .with_context(|| format!("Taxon {} has no encoding", n.tax_id))
            })
            .collect::<Result<_>>()?;

        // every name and lineage must belong to an encoded taxon
        if let Some(name) = data.names.iter().find(|n| tree.get(n.tax_id).is_none()) {
            anyhow::bail!("Name '{}' refers to unknown taxon {}", name.name_txt, name.tax_id);
        }
        if let Some(lineage) = data.lineages.iter().find(|l| tree.get(l.tax_id).is_none()) {
            anyhow::bail!("Lineage refers to unknown taxon {}", lineage.tax_id);
        }
        let names: Vec<&NameRecord> = data.names.iter().collect();
        let lineages: Vec<&LineageRecord> = data.lineages.iter().collect();

        let mut tx = self.db.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            "TRUNCATE taxtree_name, taxtree_ranked_lineage, taxtree_node, \
             taxtree_merged_node, taxtree_deleted_node RESTART IDENTITY CASCADE",
        )
        .execute(&mut *tx)
        .await
        .context("Failed to truncate taxonomy tables")?;

        insert_nodes(&mut tx, &nodes).await?;
        insert_names(&mut tx, &names).await?;
        insert_lineages(&mut tx, &lineages).await?;
        insert_merged(&mut tx, data).await?;
        insert_deleted(&mut tx, data).await?;

        let finished_at = Utc::now();
        let elapsed = (finished_at - started_at).num_milliseconds() as f64 / 1000.0;
        let duration = BigDecimal::from_str(&format!("{:.3}", elapsed.max(0.0)))
            .context("Failed to convert import duration")?;

        let import_id: i64 = sqlx::query_scalar(
            "INSERT INTO taxtree_import (source_version, started_at, finished_at, archive_md5, \
             node_count, name_count, lineage_count, merged_count, deleted_count, duration_seconds) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(data.source_version)
        .bind(started_at)
        .bind(finished_at)
        .bind(data.archive_md5.as_deref())
        .bind(nodes.len() as i64)
        .bind(names.len() as i64)
        .bind(lineages.len() as i64)
        .bind(data.merged.len() as i64)
        .bind(data.deleted.len() as i64)
        .bind(duration)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to record import")?;

        tx.commit().await.context("Failed to commit transaction")?;

        let stats = StorageStats {
            import_id,
            nodes: nodes.len(),
            names: names.len(),
            lineages: lineages.len(),
            merged: data.merged.len(),
            deleted: data.deleted.len(),
        };
        info!(?stats, "Taxonomy tables replaced");

        Ok(stats)
    }
}

async fn insert_nodes(
    tx: &mut Transaction<'_, Postgres>,
    nodes: &[(&NodeRecord, &EncodedNode)],
) -> Result<()> {
    for (i, chunk) in nodes.chunks(rows_per_statement(NODE_COLUMNS)).enumerate() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO taxtree_node (tax_id, parent_tax_id, rank, embl_code, division_id, \
             inherited_div_flag, genetic_code_id, inherited_gc_flag, mitochondrial_genetic_code_id, \
             inherited_mgc_flag, genbank_hidden_flag, hidden_subtree_root_flag, comments, \
             plastid_genetic_code_id, inherited_pgc_flag, specified_species, \
             hydrogenosome_genetic_code_id, inherited_hgc_flag, sequence_id, parent_sequence_id, \
             depth, right_bound, is_leaf) ",
        );

        qb.push_values(chunk, |mut b, (node, encoded)| {
            let e = &encoded.encoding;
            b.push_bind(node.tax_id)
                .push_bind(node.parent_tax_id)
                .push_bind(node.rank.as_str())
                .push_bind(node.embl_code.as_deref())
                .push_bind(node.division_id)
                .push_bind(node.inherited_div_flag)
                .push_bind(node.genetic_code_id)
                .push_bind(node.inherited_gc_flag)
                .push_bind(node.mitochondrial_genetic_code_id)
                .push_bind(node.inherited_mgc_flag)
                .push_bind(node.genbank_hidden_flag)
                .push_bind(node.hidden_subtree_root_flag)
                .push_bind(node.comments.as_deref())
                .push_bind(node.plastid_genetic_code_id)
                .push_bind(node.inherited_pgc_flag)
                .push_bind(node.specified_species)
                .push_bind(node.hydrogenosome_genetic_code_id)
                .push_bind(node.inherited_hgc_flag)
                .push_bind(e.sequence_id)
                .push_bind(e.parent_sequence_id)
                .push_bind(e.depth)
                .push_bind(e.right_bound)
                .push_bind(e.is_leaf);
        });

        qb.build()
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert node chunk {}", i))?;
        debug!(chunk = i, rows = chunk.len(), "Inserted nodes");
    }
    Ok(())
}

async fn insert_names(tx: &mut Transaction<'_, Postgres>, names: &[&NameRecord]) -> Result<()> {
    for (i, chunk) in names.chunks(rows_per_statement(NAME_COLUMNS)).enumerate() {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO taxtree_name (tax_id, name_txt, unique_name, name_class) ");
        qb.push_values(chunk, |mut b, name| {
            b.push_bind(name.tax_id)
                .push_bind(name.name_txt.as_str())
                .push_bind(name.unique_name.as_deref())
                .push_bind(name.name_class.as_str());
        });

        qb.build()
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert name chunk {}", i))?;
    }
    Ok(())
}

async fn insert_lineages(
    tx: &mut Transaction<'_, Postgres>,
    lineages: &[&LineageRecord],
) -> Result<()> {
    for (i, chunk) in lineages.chunks(rows_per_statement(LINEAGE_COLUMNS)).enumerate() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO taxtree_ranked_lineage (tax_id, tax_name, species, genus, family, \
             order_name, class_name, phylum, kingdom, domain) ",
        );
        qb.push_values(chunk, |mut b, l| {
            b.push_bind(l.tax_id)
                .push_bind(l.tax_name.as_str())
                .push_bind(l.species.as_deref())
                .push_bind(l.genus.as_deref())
                .push_bind(l.family.as_deref())
                .push_bind(l.order.as_deref())
                .push_bind(l.class.as_deref())
                .push_bind(l.phylum.as_deref())
                .push_bind(l.kingdom.as_deref())
                .push_bind(l.domain.as_deref());
        });

        qb.build()
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert lineage chunk {}", i))?;
    }
    Ok(())
}

async fn insert_merged(tx: &mut Transaction<'_, Postgres>, data: &TaxdumpData) -> Result<()> {
    for chunk in data.merged.chunks(rows_per_statement(2)) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO taxtree_merged_node (old_tax_id, new_tax_id) ");
        qb.push_values(chunk, |mut b, m| {
            b.push_bind(m.old_tax_id).push_bind(m.new_tax_id);
        });
        // dumps have listed the same retired id twice
        qb.push(" ON CONFLICT (old_tax_id) DO NOTHING");

        qb.build()
            .execute(&mut **tx)
            .await
            .context("Failed to insert merged taxa")?;
    }
    Ok(())
}

async fn insert_deleted(tx: &mut Transaction<'_, Postgres>, data: &TaxdumpData) -> Result<()> {
    for chunk in data.deleted.chunks(BIND_LIMIT) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO taxtree_deleted_node (tax_id) ");
        qb.push_values(chunk, |mut b, d| {
            b.push_bind(d.tax_id);
        });
        qb.push(" ON CONFLICT (tax_id) DO NOTHING");

        qb.build()
            .execute(&mut **tx)
            .await
            .context("Failed to insert deleted taxa")?;
    }
    Ok(())
}
