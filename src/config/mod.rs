//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::graphql::loaders::LoaderSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite URL (`sqlite:./repograph.db`); DATABASE_PATH may be a bare path
    pub database_url: String,

    /// Connection pool size
    pub database_max_connections: u32,

    /// Maximum estimated cost of one operation
    pub complexity_limit: usize,

    /// Time budget of one operation before it is cancelled
    pub request_timeout: Duration,

    /// Coalescing window and batch size of the per-request loaders
    pub loader: LoaderSettings,

    /// Log every SQL statement at debug level
    pub sql_debug: bool,

    /// Insert the demo dataset at startup
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` (the environment, or a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };

        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = lookup("DATABASE_PATH")
            .or_else(|| lookup("DATABASE_URL"))
            .map(|url| {
                if url.starts_with("sqlite:") {
                    url
                } else {
                    format!("sqlite:{}", url)
                }
            })
            .unwrap_or_else(|| "sqlite:./repograph.db".to_string());

        Ok(Self {
            host: var("HOST", "0.0.0.0"),

            port: var("PORT", "8080").parse().context("Invalid PORT")?,

            database_url,

            database_max_connections: var("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,

            complexity_limit: var("COMPLEXITY_LIMIT", "100")
                .parse()
                .context("Invalid COMPLEXITY_LIMIT")?,

            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS", "30")
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT_SECS")?,
            ),

            loader: LoaderSettings {
                delay: Duration::from_millis(
                    var("LOADER_DELAY_MS", "1")
                        .parse()
                        .context("Invalid LOADER_DELAY_MS")?,
                ),
                max_batch_size: var("LOADER_MAX_BATCH_SIZE", "500")
                    .parse()
                    .context("Invalid LOADER_MAX_BATCH_SIZE")?,
            },

            sql_debug: flag("SQL_DEBUG"),

            seed_demo_data: flag("SEED_DEMO_DATA"),
        })
    }

    /// `host:port` to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database_url, "sqlite:./repograph.db");
        assert_eq!(config.complexity_limit, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.loader, LoaderSettings::default());
        assert!(!config.sql_debug);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_database_path_wins() {
        let config = config(&[
            ("DATABASE_PATH", "/data/graph.db"),
            ("DATABASE_URL", "sqlite:other.db"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite:/data/graph.db");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("COMPLEXITY_LIMIT", "10"),
            ("LOADER_MAX_BATCH_SIZE", "50"),
            ("SQL_DEBUG", "1"),
        ])
        .unwrap();
        assert_eq!(config.complexity_limit, 10);
        assert_eq!(config.loader.max_batch_size, 50);
        assert!(config.sql_debug);
    }

    #[test]
    fn test_invalid_port() {
        let err = config(&[("PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid PORT");
    }
}
