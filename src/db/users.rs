//! Users: owners of repositories and projects, authors of issues.

use sqlx::sqlite::SqliteRow;

use super::orm::traits::get_text;
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::table::Table;
use crate::error::StoreResult;
use crate::graphql::pagination::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
}

impl UserRecord {
    pub const ID_PREFIX: &'static str = "U";
}

impl DatabaseEntity for UserRecord {
    const TABLE_NAME: &'static str = "users";
    const ENTITY_NAME: &'static str = "User";

    fn column_names() -> &'static [&'static str] {
        &["id", "name"]
    }
}

impl DatabaseSchema for UserRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[ColumnDef::primary_key("id"), ColumnDef::text("name")];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &["CREATE UNIQUE INDEX IF NOT EXISTS idx_users_name ON users(name)"]
    }
}

impl FromSqlRow for UserRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        Ok(Self {
            id: get_text(row, "id")?,
            name: get_text(row, "name")?,
        })
    }
}

impl ToSqlRow for UserRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![self.id.as_str().into(), self.name.as_str().into()]
    }
}

impl Keyed for UserRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<UserRecord> {
    pub async fn find_by_name(&self, name: &str) -> StoreResult<Option<UserRecord>> {
        self.query()
            .where_clause("name = ?", name)
            .fetch_optional(self.db().pool())
            .await
    }
}
