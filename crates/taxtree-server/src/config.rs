//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::search::page::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::search::PaginationLimits;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/taxtree";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub search: SearchConfig,
    pub import: ImportConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Page size bounds for every search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl SearchConfig {
    pub fn limits(&self) -> PaginationLimits {
        PaginationLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

/// Import-on-startup behaviour of the server binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Import when the database holds no taxonomy yet
    pub on_startup: bool,
    /// Local dump archive to import instead of downloading
    pub archive: Option<PathBuf>,
}

/// Read and parse an environment variable, falling back when unset or unparseable
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env();
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from the current environment without validating it
    pub fn from_env() -> Self {
        Config {
            server: ServerConfig {
                host: std::env::var("TAXTREE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("TAXTREE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "TAXTREE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            search: SearchConfig {
                default_limit: env_or("TAXTREE_SEARCH_DEFAULT_LIMIT", DEFAULT_LIMIT),
                max_limit: env_or("TAXTREE_SEARCH_MAX_LIMIT", MAX_LIMIT),
            },
            import: ImportConfig {
                on_startup: env_or("TAXTREE_IMPORT_ON_STARTUP", false),
                archive: std::env::var("TAXTREE_IMPORT_ARCHIVE")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.search.default_limit < 1 {
            anyhow::bail!("Search default limit must be at least 1");
        }

        if self.search.default_limit > self.search.max_limit {
            anyhow::bail!(
                "Search default limit ({}) cannot be greater than max limit ({})",
                self.search.default_limit,
                self.search.max_limit
            );
        }

        if let Some(ref archive) = self.import.archive {
            if !archive.exists() {
                tracing::warn!(archive = %archive.display(), "Configured import archive does not exist");
            }
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            search: SearchConfig {
                default_limit: DEFAULT_LIMIT,
                max_limit: MAX_LIMIT,
            },
            import: ImportConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "TAXTREE_PORT",
        "TAXTREE_SEARCH_DEFAULT_LIMIT",
        "TAXTREE_SEARCH_MAX_LIMIT",
        "TAXTREE_IMPORT_ON_STARTUP",
        "TAXTREE_IMPORT_ARCHIVE",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.limits(), PaginationLimits::default());
        assert!(!config.import.on_startup);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear();
        std::env::set_var("TAXTREE_PORT", "9100");
        std::env::set_var("TAXTREE_SEARCH_DEFAULT_LIMIT", "25");
        std::env::set_var("TAXTREE_SEARCH_MAX_LIMIT", "500");
        std::env::set_var("TAXTREE_IMPORT_ON_STARTUP", "true");
        std::env::set_var("TAXTREE_IMPORT_ARCHIVE", "/data/new_taxdump.tar.gz");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");

        let config = Config::from_env();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.search.default_limit, 25);
        assert_eq!(config.search.max_limit, 500);
        assert!(config.import.on_startup);
        assert_eq!(
            config.import.archive,
            Some(PathBuf::from("/data/new_taxdump.tar.gz"))
        );
        assert_eq!(config.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);

        clear();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back() {
        clear();
        std::env::set_var("TAXTREE_PORT", "eighty");
        std::env::set_var("TAXTREE_IMPORT_ON_STARTUP", "maybe");

        let config = Config::from_env();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert!(!config.import.on_startup);

        clear();
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = Config::default();
        config.search.default_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.default_limit = 200;
        config.search.max_limit = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_pool() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
