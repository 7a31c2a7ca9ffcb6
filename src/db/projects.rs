//! Projects (ProjectV2), numbered per owner.

use sqlx::sqlite::SqliteRow;

use super::orm::traits::{get_i32, get_text};
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::table::{ScopeFilter, Table};
use crate::error::StoreResult;
use crate::graphql::pagination::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub number: i32,
    pub owner_id: String,
}

impl ProjectRecord {
    pub const ID_PREFIX: &'static str = "PVT";

    /// Projects owned by one user.
    pub fn owned_by(owner_id: &str) -> ScopeFilter {
        ScopeFilter::new("owner_id", owner_id)
    }
}

impl DatabaseEntity for ProjectRecord {
    const TABLE_NAME: &'static str = "projects";
    const ENTITY_NAME: &'static str = "ProjectV2";

    fn column_names() -> &'static [&'static str] {
        &["id", "title", "url", "number", "owner_id"]
    }
}

impl DatabaseSchema for ProjectRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::text("title"),
            ColumnDef::text("url"),
            ColumnDef::integer("number"),
            ColumnDef::foreign_key("owner_id", "users(id)"),
        ];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &[
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_owner_number ON projects(owner_id, number)",
        ]
    }
}

impl FromSqlRow for ProjectRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        Ok(Self {
            id: get_text(row, "id")?,
            title: get_text(row, "title")?,
            url: get_text(row, "url")?,
            number: get_i32(Self::TABLE_NAME, row, "number")?,
            owner_id: get_text(row, "owner_id")?,
        })
    }
}

impl ToSqlRow for ProjectRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![
            self.id.as_str().into(),
            self.title.as_str().into(),
            self.url.as_str().into(),
            i64::from(self.number).into(),
            self.owner_id.as_str().into(),
        ]
    }
}

impl Keyed for ProjectRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<ProjectRecord> {
    pub async fn find_by_owner_and_number(
        &self,
        owner_id: &str,
        number: i32,
    ) -> StoreResult<Option<ProjectRecord>> {
        self.query()
            .where_clause("owner_id = ?", owner_id)
            .where_clause("number = ?", i64::from(number))
            .fetch_optional(self.db().pool())
            .await
    }
}
