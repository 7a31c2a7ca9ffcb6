//! Pull requests, numbered per repository.

use sqlx::sqlite::SqliteRow;

use super::orm::traits::{get_bool, get_i32, get_text};
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::table::{ScopeFilter, Table};
use crate::error::StoreResult;
use crate::graphql::pagination::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub id: String,
    pub base_ref_name: String,
    pub head_ref_name: String,
    pub closed: bool,
    pub url: String,
    pub number: i32,
    pub repository_id: String,
}

impl PullRequestRecord {
    pub const ID_PREFIX: &'static str = "PR";

    /// Pull requests of one repository.
    pub fn in_repository(repository_id: &str) -> ScopeFilter {
        ScopeFilter::new("repository_id", repository_id)
    }
}

impl DatabaseEntity for PullRequestRecord {
    const TABLE_NAME: &'static str = "pull_requests";
    const ENTITY_NAME: &'static str = "PullRequest";

    fn column_names() -> &'static [&'static str] {
        &[
            "id",
            "base_ref_name",
            "head_ref_name",
            "closed",
            "url",
            "number",
            "repository_id",
        ]
    }
}

impl DatabaseSchema for PullRequestRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::text("base_ref_name"),
            ColumnDef::text("head_ref_name"),
            ColumnDef::integer("closed"),
            ColumnDef::text("url"),
            ColumnDef::integer("number"),
            ColumnDef::foreign_key("repository_id", "repositories(id)"),
        ];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &[
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_pull_requests_repository_number ON pull_requests(repository_id, number)",
            "CREATE INDEX IF NOT EXISTS idx_pull_requests_repository_id ON pull_requests(repository_id, id)",
        ]
    }
}

impl FromSqlRow for PullRequestRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        Ok(Self {
            id: get_text(row, "id")?,
            base_ref_name: get_text(row, "base_ref_name")?,
            head_ref_name: get_text(row, "head_ref_name")?,
            closed: get_bool(row, "closed")?,
            url: get_text(row, "url")?,
            number: get_i32(Self::TABLE_NAME, row, "number")?,
            repository_id: get_text(row, "repository_id")?,
        })
    }
}

impl ToSqlRow for PullRequestRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![
            self.id.as_str().into(),
            self.base_ref_name.as_str().into(),
            self.head_ref_name.as_str().into(),
            self.closed.into(),
            self.url.as_str().into(),
            i64::from(self.number).into(),
            self.repository_id.as_str().into(),
        ]
    }
}

impl Keyed for PullRequestRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<PullRequestRecord> {
    pub async fn find_by_repository_and_number(
        &self,
        repository_id: &str,
        number: i32,
    ) -> StoreResult<Option<PullRequestRecord>> {
        self.query()
            .where_clause("repository_id = ?", repository_id)
            .where_clause("number = ?", i64::from(number))
            .fetch_optional(self.db().pool())
            .await
    }
}
