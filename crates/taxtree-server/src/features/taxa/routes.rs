use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::queries::{self, ResolvedTaxon, TreeRelation};
use crate::api::response::ApiResponse;
use crate::error::ApiResult;
use crate::features::{records, FeatureState};
use crate::models::TaxonRow;
use crate::search::{SearchError, SearchSpec};
use crate::tree::TaxId;

const INCLUSIVE_PARAM: &str = "inclusive";

type TaxonPath = Result<Path<TaxId>, PathRejection>;
type Params = Result<Query<Vec<(String, String)>>, QueryRejection>;

pub fn taxa_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:tax_id", get(get_taxon))
        .route("/:tax_id/names", get(get_names))
        .route("/:tax_id/lineage", get(get_lineage))
        .route("/:tax_id/descendants", get(descendants))
        .route("/:tax_id/children", get(children))
        .route("/:tax_id/siblings", get(siblings))
        .route("/:tax_id/leaves", get(leaves))
        .route("/:tax_id/ancestors", get(ancestors))
        .route("/:tax_id/relation/:other_id", get(get_relation))
        .merge(records::search_routes::<TaxonRow>())
}

fn anchor_meta(resolved: &ResolvedTaxon) -> serde_json::Value {
    json!({
        "anchor": resolved.taxon.tax_id,
        "merged_from": resolved.merged_from,
    })
}

#[tracing::instrument(skip(state, path))]
async fn get_taxon(State(state): State<FeatureState>, path: TaxonPath) -> ApiResult<Response> {
    let Path(tax_id) = path?;
    let resolved = queries::get::handle(&state.db, tax_id).await?;
    Ok(ApiResponse::success(resolved).into_response())
}

async fn get_names(State(state): State<FeatureState>, path: TaxonPath) -> ApiResult<Response> {
    let Path(tax_id) = path?;
    let (resolved, names) = queries::get::names(&state.db, tax_id).await?;
    Ok(ApiResponse::success_with_meta(names, anchor_meta(&resolved)).into_response())
}

async fn get_lineage(State(state): State<FeatureState>, path: TaxonPath) -> ApiResult<Response> {
    let Path(tax_id) = path?;
    let (resolved, lineage) = queries::get::lineage(&state.db, tax_id).await?;
    Ok(ApiResponse::success_with_meta(lineage, anchor_meta(&resolved)).into_response())
}

async fn get_relation(
    State(state): State<FeatureState>,
    path: Result<Path<(TaxId, TaxId)>, PathRejection>,
) -> ApiResult<Response> {
    let Path((tax_id, other_id)) = path?;
    let relation = queries::relation::handle(&state.db, tax_id, other_id).await?;
    Ok(ApiResponse::success(relation).into_response())
}

async fn descendants(state: State<FeatureState>, path: TaxonPath, params: Params) -> ApiResult<Response> {
    tree_search(state, path, params, |inclusive| TreeRelation::Descendants { inclusive }).await
}

async fn children(state: State<FeatureState>, path: TaxonPath, params: Params) -> ApiResult<Response> {
    tree_search(state, path, params, |_| TreeRelation::Children).await
}

async fn siblings(state: State<FeatureState>, path: TaxonPath, params: Params) -> ApiResult<Response> {
    tree_search(state, path, params, |_| TreeRelation::Siblings).await
}

async fn leaves(state: State<FeatureState>, path: TaxonPath, params: Params) -> ApiResult<Response> {
    tree_search(state, path, params, |_| TreeRelation::Leaves).await
}

async fn ancestors(state: State<FeatureState>, path: TaxonPath, params: Params) -> ApiResult<Response> {
    tree_search(state, path, params, |inclusive| TreeRelation::Ancestors { inclusive }).await
}

async fn tree_search(
    State(state): State<FeatureState>,
    path: TaxonPath,
    params: Params,
    relation: impl FnOnce(bool) -> TreeRelation,
) -> ApiResult<Response> {
    let Path(tax_id) = path?;
    let Query(params) = params?;
    let (inclusive, spec) = split_inclusive(params)?;
    let relation = relation(inclusive);

    let result =
        queries::tree::handle(&state.db, &state.limits, tax_id, relation, spec).await?;

    tracing::debug!(
        tax_id,
        relation = relation.name(),
        count = result.page.count,
        "Tree search completed"
    );

    let meta = json!({
        "anchor": result.anchor,
        "relation": relation.name(),
        "merged_from": result.merged_from,
    });
    Ok(ApiResponse::success_with_meta(result.page, meta).into_response())
}

/// Pull the `inclusive` flag out of the query string; everything else is a
/// search field.
fn split_inclusive(params: Vec<(String, String)>) -> Result<(bool, SearchSpec), SearchError> {
    let mut inclusive = false;
    let mut fields = Vec::with_capacity(params.len());

    for (name, value) in params {
        if name != INCLUSIVE_PARAM {
            fields.push((name, value));
            continue;
        }
        inclusive = match value.as_str() {
            "" | "false" | "0" => false,
            "true" | "1" => true,
            _ => {
                return Err(SearchError::InvalidParameter {
                    name: INCLUSIVE_PARAM.to_string(),
                    value,
                })
            },
        };
    }

    Ok((inclusive, SearchSpec::from_query_params(fields)?))
}
