//! Project items: an issue or a pull request placed on a project.

use sqlx::sqlite::SqliteRow;

use super::orm::traits::{get_text, get_text_opt};
use super::orm::{ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue, ToSqlRow};
use super::table::{ScopeFilter, Table};
use crate::error::{StoreError, StoreResult};
use crate::graphql::pagination::Keyed;

/// What a project item points at. Exactly one of the two columns is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectItemContent {
    Issue(String),
    PullRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItemRecord {
    pub id: String,
    pub project_id: String,
    pub content: ProjectItemContent,
}

impl ProjectItemRecord {
    pub const ID_PREFIX: &'static str = "PVTI";

    /// Items placed on one project.
    pub fn in_project(project_id: &str) -> ScopeFilter {
        ScopeFilter::new("project_id", project_id)
    }

    /// Items whose content is this issue.
    pub fn for_issue(issue_id: &str) -> ScopeFilter {
        ScopeFilter::new("issue_id", issue_id)
    }

    /// Items whose content is this pull request.
    pub fn for_pull_request(pull_request_id: &str) -> ScopeFilter {
        ScopeFilter::new("pull_request_id", pull_request_id)
    }
}

impl DatabaseEntity for ProjectItemRecord {
    const TABLE_NAME: &'static str = "project_items";
    const ENTITY_NAME: &'static str = "ProjectV2Item";

    fn column_names() -> &'static [&'static str] {
        &["id", "project_id", "issue_id", "pull_request_id"]
    }
}

impl DatabaseSchema for ProjectItemRecord {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::foreign_key("project_id", "projects(id)"),
            ColumnDef::foreign_key("issue_id", "issues(id)").nullable(),
            ColumnDef::foreign_key("pull_request_id", "pull_requests(id)").nullable(),
        ];
        COLUMNS
    }

    fn indexes() -> &'static [&'static str] {
        &[
            "CREATE INDEX IF NOT EXISTS idx_project_items_project_id ON project_items(project_id, id)",
            "CREATE INDEX IF NOT EXISTS idx_project_items_issue_id ON project_items(issue_id, id)",
            "CREATE INDEX IF NOT EXISTS idx_project_items_pull_request_id ON project_items(pull_request_id, id)",
        ]
    }
}

impl FromSqlRow for ProjectItemRecord {
    fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        let content = match (
            get_text_opt(row, "issue_id")?,
            get_text_opt(row, "pull_request_id")?,
        ) {
            (Some(issue_id), None) => ProjectItemContent::Issue(issue_id),
            (None, Some(pull_request_id)) => ProjectItemContent::PullRequest(pull_request_id),
            _ => {
                return Err(StoreError::Decode {
                    table: Self::TABLE_NAME,
                    column: "issue_id",
                    message: "item must reference exactly one of issue_id, pull_request_id"
                        .to_string(),
                });
            }
        };

        Ok(Self {
            id: get_text(row, "id")?,
            project_id: get_text(row, "project_id")?,
            content,
        })
    }
}

impl ToSqlRow for ProjectItemRecord {
    fn to_sql_values(&self) -> Vec<SqlValue> {
        let (issue_id, pull_request_id) = match &self.content {
            ProjectItemContent::Issue(id) => (Some(id.as_str()), None),
            ProjectItemContent::PullRequest(id) => (None, Some(id.as_str())),
        };
        vec![
            self.id.as_str().into(),
            self.project_id.as_str().into(),
            issue_id.into(),
            pull_request_id.into(),
        ]
    }
}

impl Keyed for ProjectItemRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Table<ProjectItemRecord> {
    /// Place an issue or pull request on a project under a fresh item ID.
    pub async fn add_project_item(
        &self,
        project_id: &str,
        content: ProjectItemContent,
    ) -> StoreResult<ProjectItemRecord> {
        let record = ProjectItemRecord {
            id: self.db().ids().next_id(ProjectItemRecord::ID_PREFIX),
            project_id: project_id.to_string(),
            content,
        };
        self.insert(&record).await?;

        tracing::debug!(
            project_id = %record.project_id,
            item_id = %record.id,
            "Added item to project"
        );
        Ok(record)
    }
}
