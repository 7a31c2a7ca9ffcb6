//! SQL query builder over `DatabaseEntity` types
//!
//! Builds parameterized SELECT / EXISTS / INSERT statements with `?N`
//! placeholders and runs them through sqlx.

use std::marker::PhantomData;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteQueryResult;

use super::traits::{DatabaseEntity, FromSqlRow, SortDirection, SqlValue};
use crate::error::{StoreError, StoreResult};

/// A query builder for database entities.
pub struct EntityQuery<E: DatabaseEntity> {
    _phantom: PhantomData<E>,
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<u64>,
    param_counter: usize,
    log_statements: bool,
}

impl<E: DatabaseEntity + FromSqlRow> EntityQuery<E> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
            where_clauses: Vec::new(),
            values: Vec::new(),
            order_by: None,
            limit: None,
            param_counter: 0,
            log_statements: false,
        }
    }

    /// Log every statement at debug level (the `SQL_DEBUG` setting).
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Add a WHERE condition with a single `?` placeholder.
    pub fn where_clause(mut self, condition: &str, value: impl Into<SqlValue>) -> Self {
        self.param_counter += 1;
        let rewritten = condition.replacen('?', &format!("?{}", self.param_counter), 1);
        self.where_clauses.push(rewritten);
        self.values.push(value.into());
        self
    }

    /// Add `column IN (...)`. An empty list matches nothing.
    pub fn where_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let mut placeholders = Vec::new();
        for value in values {
            self.param_counter += 1;
            placeholders.push(format!("?{}", self.param_counter));
            self.values.push(value.into());
        }

        if placeholders.is_empty() {
            self.where_clauses.push("1 = 0".to_string());
        } else {
            self.where_clauses
                .push(format!("{} IN ({})", column, placeholders.join(", ")));
        }
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order_by = Some(format!("{} {}", column, direction.to_sql()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Build the SELECT statement.
    pub fn build_sql(&self) -> String {
        let mut sql = E::select_sql();
        sql.push_str(&self.where_sql());

        if let Some(ref order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    /// Build `SELECT EXISTS(...)` over the same conditions.
    pub fn build_exists_sql(&self) -> String {
        format!(
            "SELECT EXISTS(SELECT 1 FROM {}{})",
            E::TABLE_NAME,
            self.where_sql()
        )
    }

    fn trace(&self, sql: &str) {
        if self.log_statements {
            tracing::debug!(entity = E::TABLE_NAME, sql = %sql, binds = self.values.len(), "Executing entity query");
        } else {
            tracing::trace!(entity = E::TABLE_NAME, sql = %sql, "Executing entity query");
        }
    }

    /// Execute the query and return all matching entities.
    pub async fn fetch_all(self, pool: &SqlitePool) -> StoreResult<Vec<E>> {
        let sql = self.build_sql();
        self.trace(&sql);

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(pool).await?;
        rows.iter().map(E::from_row).collect()
    }

    /// Execute the query and return at most one entity.
    pub async fn fetch_optional(self, pool: &SqlitePool) -> StoreResult<Option<E>> {
        let sql = self.build_sql();
        self.trace(&sql);

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        match query.fetch_optional(pool).await? {
            Some(row) => Ok(Some(E::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Whether any row matches the conditions.
    pub async fn exists(self, pool: &SqlitePool) -> StoreResult<bool> {
        let sql = self.build_exists_sql();
        self.trace(&sql);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &self.values {
            query = match value {
                SqlValue::String(s) => query.bind(s.as_str()),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
                SqlValue::Null => query.bind(None::<String>),
            };
        }

        Ok(query.fetch_one(pool).await? != 0)
    }
}

impl<E: DatabaseEntity + FromSqlRow> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build `INSERT [OR IGNORE] INTO table (cols) VALUES (?1, ...)` for an entity.
pub fn insert_sql<E: DatabaseEntity>(or_ignore: bool) -> String {
    let columns = E::column_names();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT {}INTO {} ({}) VALUES ({})",
        if or_ignore { "OR IGNORE " } else { "" },
        E::TABLE_NAME,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Execute an INSERT/UPDATE statement with bound values.
///
/// Constraint violations come back as [`StoreError::Conflict`].
pub async fn execute_with_binds(
    sql: &str,
    values: &[SqlValue],
    pool: &SqlitePool,
) -> StoreResult<SqliteQueryResult> {
    let mut query = sqlx::query(sql);
    for value in values {
        query = value.bind_to_query(query);
    }

    query.execute(pool).await.map_err(|e| match e {
        sqlx::Error::Database(ref db)
            if db.is_unique_violation() || db.is_foreign_key_violation() =>
        {
            StoreError::Conflict(db.message().to_string())
        }
        other => StoreError::Database(other),
    })
}
