//! Taxon lookups by id
//!
//! Ids retired by NCBI stay resolvable: a merged id resolves to the taxon it
//! was folded into, a deleted id is reported as gone.

use sqlx::PgPool;

use super::DbResult;
use crate::models::{ImportRunRow, LineageRow, NameRow, Record, TaxonRow};
use crate::tree::TaxId;

#[derive(Debug, Clone, PartialEq)]
pub enum TaxonLookup {
    Found {
        taxon: TaxonRow,
        /// The requested id when it was merged into `taxon`
        merged_from: Option<TaxId>,
    },
    Deleted(TaxId),
    Missing(TaxId),
}

async fn find_taxon(pool: &PgPool, tax_id: TaxId) -> DbResult<Option<TaxonRow>> {
    let schema = TaxonRow::KIND.schema();
    let sql = format!(
        "SELECT {} FROM {} WHERE tax_id = $1",
        schema.select_list(),
        schema.table
    );

    Ok(sqlx::query_as::<_, TaxonRow>(&sql)
        .bind(tax_id)
        .fetch_optional(pool)
        .await?)
}

/// Resolve a requested id: current taxa first, then merged ids, then deleted ids
#[tracing::instrument(skip(pool))]
pub async fn resolve_taxon(pool: &PgPool, tax_id: TaxId) -> DbResult<TaxonLookup> {
    if let Some(taxon) = find_taxon(pool, tax_id).await? {
        return Ok(TaxonLookup::Found {
            taxon,
            merged_from: None,
        });
    }

    let merged_into: Option<TaxId> =
        sqlx::query_scalar("SELECT new_tax_id FROM taxtree_merged_node WHERE old_tax_id = $1")
            .bind(tax_id)
            .fetch_optional(pool)
            .await?;

    if let Some(new_tax_id) = merged_into {
        return match find_taxon(pool, new_tax_id).await? {
            Some(taxon) => {
                tracing::debug!(tax_id, new_tax_id, "Resolved merged taxon");
                Ok(TaxonLookup::Found {
                    taxon,
                    merged_from: Some(tax_id),
                })
            },
            None => {
                tracing::warn!(tax_id, new_tax_id, "Merged taxon points at a missing node");
                Ok(TaxonLookup::Missing(tax_id))
            },
        };
    }

    let deleted: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM taxtree_deleted_node WHERE tax_id = $1)")
            .bind(tax_id)
            .fetch_one(pool)
            .await?;

    Ok(if deleted {
        TaxonLookup::Deleted(tax_id)
    } else {
        TaxonLookup::Missing(tax_id)
    })
}

pub async fn names_for(pool: &PgPool, tax_id: TaxId) -> DbResult<Vec<NameRow>> {
    Ok(sqlx::query_as::<_, NameRow>(
        "SELECT id, tax_id, name_txt, unique_name, name_class FROM taxtree_name \
         WHERE tax_id = $1 ORDER BY name_class, name_txt",
    )
    .bind(tax_id)
    .fetch_all(pool)
    .await?)
}

pub async fn lineage_for(pool: &PgPool, tax_id: TaxId) -> DbResult<Option<LineageRow>> {
    let schema = LineageRow::KIND.schema();
    let sql = format!(
        "SELECT {} FROM {} WHERE tax_id = $1",
        schema.select_list(),
        schema.table
    );

    Ok(sqlx::query_as::<_, LineageRow>(&sql)
        .bind(tax_id)
        .fetch_optional(pool)
        .await?)
}

/// Most recent completed import, if any
pub async fn latest_import(pool: &PgPool) -> DbResult<Option<ImportRunRow>> {
    let schema = ImportRunRow::KIND.schema();
    let sql = format!(
        "SELECT {} FROM {} ORDER BY finished_at DESC, id DESC LIMIT 1",
        schema.select_list(),
        schema.table
    );

    Ok(sqlx::query_as::<_, ImportRunRow>(&sql)
        .fetch_optional(pool)
        .await?)
}

/// Whether any taxonomy has been loaded
pub async fn is_populated(pool: &PgPool) -> DbResult<bool> {
    Ok(sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM taxtree_node)")
        .fetch_one(pool)
        .await?)
}
