use serde::Serialize;
use sqlx::PgPool;

use crate::db::{taxa, DbError, TaxonLookup};
use crate::error::{ApiResult, AppError};
use crate::models::{LineageRow, NameRow, TaxonRow};
use crate::tree::TaxId;

/// A taxon reached through a requested id, possibly via a merge
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTaxon {
    #[serde(flatten)]
    pub taxon: TaxonRow,
    /// The requested id when it was merged into `taxon`
    pub merged_from: Option<TaxId>,
}

/// Resolve a requested id to a current taxon. Deleted ids are `410`,
/// unknown ids `404`.
pub async fn resolve_anchor(pool: &PgPool, tax_id: TaxId) -> ApiResult<ResolvedTaxon> {
    match taxa::resolve_taxon(pool, tax_id).await? {
        TaxonLookup::Found { taxon, merged_from } => Ok(ResolvedTaxon { taxon, merged_from }),
        TaxonLookup::Deleted(id) => Err(AppError::Gone(id)),
        TaxonLookup::Missing(id) => Err(AppError::taxon_not_found(id)),
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, tax_id: TaxId) -> ApiResult<ResolvedTaxon> {
    resolve_anchor(pool, tax_id).await
}

#[tracing::instrument(skip(pool))]
pub async fn names(pool: &PgPool, tax_id: TaxId) -> ApiResult<(ResolvedTaxon, Vec<NameRow>)> {
    let resolved = resolve_anchor(pool, tax_id).await?;
    let names = taxa::names_for(pool, resolved.taxon.tax_id).await?;
    Ok((resolved, names))
}

#[tracing::instrument(skip(pool))]
pub async fn lineage(pool: &PgPool, tax_id: TaxId) -> ApiResult<(ResolvedTaxon, LineageRow)> {
    let resolved = resolve_anchor(pool, tax_id).await?;
    let lineage = taxa::lineage_for(pool, resolved.taxon.tax_id)
        .await?
        .ok_or_else(|| DbError::not_found("Lineage for taxon", resolved.taxon.tax_id))?;
    Ok((resolved, lineage))
}
