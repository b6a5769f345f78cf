//! taxtree server - Main entry point

use anyhow::{Context, Result};
use taxtree_common::logging::{init_logging, LogConfig};
use tracing::info;

use taxtree_server::{
    api,
    config::Config,
    db,
    ingest::ncbi_taxonomy::{ImportOptions, NcbiTaxonomyFtpConfig, TaxtreePipeline},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("taxtree-server")
        .filter_directives("taxtree_server=debug,tower_http=debug,sqlx=info")
        .build()
        .with_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting taxtree server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations completed");

    if config.import.on_startup {
        let pipeline = TaxtreePipeline::new(NcbiTaxonomyFtpConfig::new(), pool.clone());
        let options = ImportOptions {
            archive: config.import.archive.clone(),
            ..Default::default()
        };

        info!("Import on startup is enabled");
        let result = pipeline.run(&options).await.context("Startup import failed")?;
        info!("{}", result.summary());
    }

    api::serve(pool, &config).await
}
