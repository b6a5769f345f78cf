use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::api::response::ApiResponse;
use crate::error::ApiResult;
use crate::features::FeatureState;
use crate::models::Record;
use crate::search::SearchSpec;

/// `GET|POST /search` for record kind `T`
pub fn search_routes<T: Record>() -> Router<FeatureState> {
    Router::new().route("/search", get(search_by_query::<T>).post(search_by_body::<T>))
}

async fn search_by_query<T: Record>(
    State(state): State<FeatureState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let spec = SearchSpec::from_query_params(params)?;
    respond::<T>(&state, spec).await
}

async fn search_by_body<T: Record>(
    State(state): State<FeatureState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let spec = SearchSpec::from_json(body)?;
    respond::<T>(&state, spec).await
}

async fn respond<T: Record>(state: &FeatureState, spec: SearchSpec) -> ApiResult<Response> {
    let page = super::queries::search::<T>(&state.db, &state.limits, spec).await?;

    tracing::debug!(
        table = T::KIND.schema().table,
        count = page.count,
        returned = page.results.len(),
        "Search completed"
    );

    Ok(ApiResponse::success(page).into_response())
}
