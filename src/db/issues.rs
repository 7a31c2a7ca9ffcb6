//! Issues, numbered per repository.

use sqlx::sqlite::SqliteRow;

use super::orm::traits::{get_bool, get_i32, get_text};
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::table::{ScopeFilter, Table};
use crate::error::StoreResult;
use crate::graphql::pagination::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub closed: bool,
    pub number: i32,
    pub repository_id: String,
    pub author_id: String,
}

impl IssueRecord {
    pub const ID_PREFIX: &'static str = "ISSUE";

    /// Issues of one repository.
    pub fn in_repository(repository_id: &str) -> ScopeFilter {
        ScopeFilter::new("repository_id", repository_id)
    }
}

impl DatabaseEntity for IssueRecord {
    const TABLE_NAME: &'static str = "issues";
    const ENTITY_NAME: &'static str = "Issue";

    fn column_names() -> &'static [&'static str] {
        &["id", "url", "title", "closed", "number", "repository_id", "author_id"]
    }
}

impl DatabaseSchema for IssueRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::text("url"),
            ColumnDef::text("title"),
            ColumnDef::integer("closed"),
            ColumnDef::integer("number"),
            ColumnDef::foreign_key("repository_id", "repositories(id)"),
            ColumnDef::foreign_key("author_id", "users(id)"),
        ];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &[
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_issues_repository_number ON issues(repository_id, number)",
            "CREATE INDEX IF NOT EXISTS idx_issues_repository_id ON issues(repository_id, id)",
        ]
    }
}

impl FromSqlRow for IssueRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        Ok(Self {
            id: get_text(row, "id")?,
            url: get_text(row, "url")?,
            title: get_text(row, "title")?,
            closed: get_bool(row, "closed")?,
            number: get_i32(Self::TABLE_NAME, row, "number")?,
            repository_id: get_text(row, "repository_id")?,
            author_id: get_text(row, "author_id")?,
        })
    }
}

impl ToSqlRow for IssueRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![
            self.id.as_str().into(),
            self.url.as_str().into(),
            self.title.as_str().into(),
            self.closed.into(),
            i64::from(self.number).into(),
            self.repository_id.as_str().into(),
            self.author_id.as_str().into(),
        ]
    }
}

impl Keyed for IssueRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<IssueRecord> {
    pub async fn find_by_repository_and_number(
        &self,
        repository_id: &str,
        number: i32,
    ) -> StoreResult<Option<IssueRecord>> {
        self.query()
            .where_clause("repository_id = ?", repository_id)
            .where_clause("number = ?", i64::from(number))
            .fetch_optional(self.db().pool())
            .await
    }
}
