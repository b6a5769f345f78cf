use sqlx::PgPool;

use crate::db::{run_search, SearchPage};
use crate::error::ApiResult;
use crate::models::Record;
use crate::search::{compile, PaginationLimits, SearchSpec};

/// Compile `spec` against `T`'s schema and run it
#[tracing::instrument(skip(pool, spec), fields(table = T::KIND.schema().table, fields = spec.fields.len()))]
pub async fn handle<T: Record>(
    pool: &PgPool,
    limits: &PaginationLimits,
    spec: SearchSpec,
) -> ApiResult<SearchPage<T>> {
    let compiled = compile(T::KIND.schema(), &spec, limits)?;
    Ok(run_search::<T>(pool, compiled, None).await?)
}
