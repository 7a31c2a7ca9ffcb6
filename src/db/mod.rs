//! Database connection and tables
//!
//! Re-exports are provided for convenience, even if not all are used within the crate.

pub mod ids;
pub mod issues;
pub mod orm;
pub mod project_items;
pub mod projects;
pub mod pull_requests;
pub mod repositories;
pub mod schema_sync;
pub mod seed;
pub mod sqlite_helpers;
pub mod table;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use ids::{IdGenerator, SortableIdGenerator};
pub use issues::IssueRecord;
pub use project_items::{ProjectItemContent, ProjectItemRecord};
pub use projects::ProjectRecord;
pub use pull_requests::PullRequestRecord;
pub use repositories::RepositoryRecord;
pub use table::{ScopeFilter, Table};
pub use users::UserRecord;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    sql_debug: bool,
    ids: Arc<dyn IdGenerator>,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            sql_debug: false,
            ids: Arc::new(SortableIdGenerator::new()),
        }
    }

    /// Open (and create if missing) a SQLite database
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid DATABASE_URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        tracing::info!(url, max_connections, "Connected to database");
        Ok(Self::new(pool))
    }

    /// A private in-memory database that lives as long as this pool.
    ///
    /// Every connection to `sqlite::memory:` is a separate database, so the
    /// pool holds exactly one connection and never recycles it.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self::new(pool))
    }

    /// Log every SQL statement at debug level
    pub fn with_sql_debug(mut self, enabled: bool) -> Self {
        self.sql_debug = enabled;
        self
    }

    /// Replace the record ID generator
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sql_debug(&self) -> bool {
        self.sql_debug
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    pub fn users(&self) -> Table<UserRecord> {
        Table::new(self.clone())
    }

    pub fn repositories(&self) -> Table<RepositoryRecord> {
        Table::new(self.clone())
    }

    pub fn issues(&self) -> Table<IssueRecord> {
        Table::new(self.clone())
    }

    pub fn pull_requests(&self) -> Table<PullRequestRecord> {
        Table::new(self.clone())
    }

    pub fn projects(&self) -> Table<ProjectRecord> {
        Table::new(self.clone())
    }

    pub fn project_items(&self) -> Table<ProjectItemRecord> {
        Table::new(self.clone())
    }

    /// Create missing tables, columns and indexes
    pub async fn sync_schema(&self) -> Result<schema_sync::SchemaSyncResult> {
        let result = schema_sync::sync_all_entity_schemas(&self.pool).await;
        if !result.errors.is_empty() {
            anyhow::bail!("Schema sync failed: {}", result.errors.join("; "));
        }
        Ok(result)
    }
}
