//! Repositories, owned by a user and unique per `(owner, name)`.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;

use super::orm::traits::get_text;
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::sqlite_helpers::{datetime_to_str, str_to_datetime};
use super::table::Table;
use crate::error::StoreResult;
use crate::graphql::pagination::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl RepositoryRecord {
    pub const ID_PREFIX: &'static str = "REPO";
}

impl DatabaseEntity for RepositoryRecord {
    const TABLE_NAME: &'static str = "repositories";
    const ENTITY_NAME: &'static str = "Repository";

    fn column_names() -> &'static [&'static str] {
        &["id", "owner_id", "name", "created_at"]
    }
}

impl DatabaseSchema for RepositoryRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::foreign_key("owner_id", "users(id)"),
            ColumnDef::text("name"),
            ColumnDef::text("created_at"),
        ];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &[
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_repositories_owner_name ON repositories(owner_id, name)",
        ]
    }
}

impl FromSqlRow for RepositoryRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        let created_at = get_text(row, "created_at")?;
        Ok(Self {
            id: get_text(row, "id")?,
            owner_id: get_text(row, "owner_id")?,
            name: get_text(row, "name")?,
            created_at: str_to_datetime(Self::TABLE_NAME, "created_at", &created_at)?,
        })
    }
}

impl ToSqlRow for RepositoryRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![
            self.id.as_str().into(),
            self.owner_id.as_str().into(),
            self.name.as_str().into(),
            datetime_to_str(self.created_at).into(),
        ]
    }
}

impl Keyed for RepositoryRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<RepositoryRecord> {
    /// Resolve `owner/name`, the way repositories are addressed from outside.
    pub async fn find_by_owner_and_name(
        &self,
        owner_name: &str,
        name: &str,
    ) -> StoreResult<Option<RepositoryRecord>> {
        let Some(owner) = self.db().users().find_by_name(owner_name).await? else {
            return Ok(None);
        };
        self.query()
            .where_clause("owner_id = ?", owner.id)
            .where_clause("name = ?", name)
            .fetch_optional(self.db().pool())
            .await
    }
}
