//! Feature modules implementing the taxtree API
//!
//! Each feature is organized as a vertical slice with its own queries and
//! routes. The API is read-only; data changes only through an import.
//!
//! # Features
//!
//! - **taxa**: taxon lookup, names, lineage and tree queries
//! - **records**: typed search, mounted once per record kind

pub mod records;
pub mod taxa;

use axum::Router;
use sqlx::PgPool;

use crate::models::{DeletedRow, ImportRunRow, LineageRow, MergedRow, NameRow};
use crate::search::PaginationLimits;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: PgPool,
    /// Bounds applied to every search
    pub limits: PaginationLimits,
}

/// Creates the API router with all feature routes mounted
///
/// - `/taxa` - taxon lookup, tree queries and taxon search
/// - `/names`, `/lineages`, `/merged`, `/deleted`, `/imports` - record search
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/taxa", taxa::taxa_routes())
        .nest("/names", records::search_routes::<NameRow>())
        .nest("/lineages", records::search_routes::<LineageRow>())
        .nest("/merged", records::search_routes::<MergedRow>())
        .nest("/deleted", records::search_routes::<DeletedRow>())
        .nest("/imports", records::search_routes::<ImportRunRow>())
        .with_state(state)
}
