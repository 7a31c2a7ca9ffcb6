//! Core traits for the table layer
//!
//! Each record type in `db/` describes its table through these traits so the
//! query builder, the schema sync and the keyset source can work on any of them.

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::error::{StoreError, StoreResult};

/// Column definition for schema generation.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name in the database
    pub name: &'static str,
    /// SQLite column type (TEXT, INTEGER)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Whether this is the primary key
    pub is_primary_key: bool,
    /// Referenced `table(column)` for foreign keys
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn primary_key(name: &'static str) -> Self {
        Self {
            name,
            sql_type: "TEXT",
            nullable: false,
            is_primary_key: true,
            references: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            sql_type: "TEXT",
            nullable: false,
            is_primary_key: false,
            references: None,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            sql_type: "INTEGER",
            nullable: false,
            is_primary_key: false,
            references: None,
        }
    }

    pub const fn foreign_key(name: &'static str, references: &'static str) -> Self {
        Self {
            name,
            sql_type: "TEXT",
            nullable: false,
            is_primary_key: false,
            references: Some(references),
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Generate the column definition SQL
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if !self.nullable && !self.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if let Some(target) = self.references {
            sql.push_str(&format!(" REFERENCES {}", target));
        }

        sql
    }
}

/// Metadata about a database entity (table).
pub trait DatabaseEntity: Sized + Send + Sync {
    /// The SQL table name (e.g., "issues")
    const TABLE_NAME: &'static str;

    /// Name used in logs and not-found errors (e.g., "Issue")
    const ENTITY_NAME: &'static str;

    /// The primary key column; keyset order is defined on it
    const PRIMARY_KEY: &'static str = "id";

    /// List of all column names in the table
    fn column_names() -> &'static [&'static str];

    /// Build a SELECT query for all columns
    fn select_sql() -> String {
        let columns = Self::column_names().join(", ");
        format!("SELECT {} FROM {}", columns, Self::TABLE_NAME)
    }
}

/// Trait for database schema generation and migration.
pub trait DatabaseSchema: DatabaseEntity {
    /// Get all column definitions for this entity's table
    fn columns() -> &'static [ColumnDef];

    /// Extra `CREATE INDEX IF NOT EXISTS` / `CREATE UNIQUE INDEX` statements
    fn indexes() -> &'static [&'static str] {
        &[]
    }

    /// Generate CREATE TABLE IF NOT EXISTS SQL
    fn create_table_sql() -> String {
        let column_defs: Vec<String> = Self::columns().iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            Self::TABLE_NAME,
            column_defs.join(",\n  ")
        )
    }

    /// Get column names that exist in the entity definition
    fn defined_column_names() -> Vec<&'static str> {
        Self::columns().iter().map(|c| c.name).collect()
    }
}

/// Trait for decoding a database row into an entity.
pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> StoreResult<Self>;
}

/// Values of a record in `column_names()` order, used for inserts.
pub trait ToSqlRow {
    fn to_sql_values(&self) -> Vec<SqlValue>;
}

/// Sort direction for ORDER BY clauses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Bind this value to a sqlx query builder
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

// ============================================================================
// Row decoding helpers
// ============================================================================

/// Read a TEXT column.
pub fn get_text(row: &SqliteRow, column: &'static str) -> StoreResult<String> {
    Ok(row.try_get::<String, _>(column)?)
}

/// Read a nullable TEXT column.
pub fn get_text_opt(row: &SqliteRow, column: &'static str) -> StoreResult<Option<String>> {
    Ok(row.try_get::<Option<String>, _>(column)?)
}

/// Read an INTEGER column holding 0/1.
pub fn get_bool(row: &SqliteRow, column: &'static str) -> StoreResult<bool> {
    Ok(row.try_get::<i64, _>(column)? != 0)
}

/// Read an INTEGER column that must fit an `i32`.
pub fn get_i32(table: &'static str, row: &SqliteRow, column: &'static str) -> StoreResult<i32> {
    let value = row.try_get::<i64, _>(column)?;
    i32::try_from(value).map_err(|_| StoreError::Decode {
        table,
        column,
        message: format!("{} does not fit a 32-bit integer", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_sql() {
        assert_eq!(ColumnDef::primary_key("id").to_sql(), "id TEXT PRIMARY KEY");
        assert_eq!(ColumnDef::integer("number").to_sql(), "number INTEGER NOT NULL");
        assert_eq!(
            ColumnDef::foreign_key("issue_id", "issues(id)").nullable().to_sql(),
            "issue_id TEXT REFERENCES issues(id)"
        );
    }

    #[test]
    fn test_option_into_sql_value() {
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(
            SqlValue::from(Some("PR_1")),
            SqlValue::String("PR_1".to_string())
        );
    }
}
