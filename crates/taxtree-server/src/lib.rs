//! taxtree server library
//!
//! Imports the NCBI Taxonomy dump into PostgreSQL and serves it over a
//! read-only REST API.
//!
//! # Overview
//!
//! - **tree**: nested-set encoding of the taxonomy and the interval queries
//!   derived from it (subtree, children, siblings, leaves, ancestors)
//! - **search**: compiles sparse search requests into typed predicates
//! - **db**: SQL rendering and execution against PostgreSQL with SQLx
//! - **ingest**: taxdump download, parsing and bulk replacement
//! - **features**: Axum route handlers, one vertical slice per feature
//!
//! # Example
//!
//! ```no_run
//! use taxtree_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     api::serve(pool, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod search;
pub mod tree;

pub use error::{ApiResult, AppError};
