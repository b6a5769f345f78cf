use serde::Serialize;
use sqlx::PgPool;

use super::get::resolve_anchor;
use crate::error::ApiResult;
use crate::tree::{interval::relation, Relation, TaxId};

/// How `other_id` sits relative to `tax_id` in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationResponse {
    pub tax_id: TaxId,
    pub other_id: TaxId,
    pub relation: Relation,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, tax_id: TaxId, other_id: TaxId) -> ApiResult<RelationResponse> {
    let (anchor, other) =
        tokio::try_join!(resolve_anchor(pool, tax_id), resolve_anchor(pool, other_id))?;

    Ok(RelationResponse {
        tax_id: anchor.taxon.tax_id,
        other_id: other.taxon.tax_id,
        relation: relation(&anchor.taxon.encoding(), &other.taxon.encoding()),
    })
}
