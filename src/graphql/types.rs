//! GraphQL object types
//!
//! Each object wraps its stored record. Reference fields go through the
//! operation's batch loaders; list fields are keyset connections scoped to
//! the parent object.

use async_graphql::{Context, ID, InputObject, Interface, Object, Result, SimpleObject, Union};
use chrono::{DateTime, Utc};

use super::complexity::estimate_cost;
use super::operation::{OperationExt, ResolveResultExt};
use super::pagination::{Connection, ConnectionArgs};
use crate::db::table::Record;
use crate::db::{
    IssueRecord, ProjectItemContent, ProjectItemRecord, ProjectRecord, PullRequestRecord,
    RepositoryRecord, ScopeFilter, Table, UserRecord,
};
use crate::define_connection;

/// Page one connection of `table` within `scope` and wrap each record.
async fn connection<E, N>(
    ctx: &Context<'_>,
    table: Table<E>,
    scope: ScopeFilter,
    args: ConnectionArgs,
    wrap: fn(E) -> N,
) -> Result<Connection<N>>
where
    E: Record,
    N: Clone,
{
    let op = ctx.operation()?;
    let page = op.page(&table, &scope, &args).await.gql()?;
    Ok(Connection::assemble(page).map(wrap))
}

// ============================================================================
// Node
// ============================================================================

/// Any object addressable by its global ID
#[derive(Interface)]
#[graphql(field(name = "id", ty = "ID"))]
pub enum Node {
    User(User),
    Repository(Repository),
    Issue(Issue),
    PullRequest(PullRequest),
    ProjectV2(ProjectV2),
    ProjectV2Item(ProjectV2Item),
}

/// The type prefix of a global ID (`"ISSUE"` for `ISSUE_0192...`).
pub fn id_prefix(id: &str) -> Option<&str> {
    id.split_once('_')
        .map(|(prefix, _)| prefix)
        .filter(|prefix| !prefix.is_empty())
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone)]
pub struct User(pub UserRecord);

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    /// One of the user's projects, by number
    #[graphql(name = "projectV2")]
    async fn project_v2(&self, ctx: &Context<'_>, number: i32) -> Result<Option<ProjectV2>> {
        let op = ctx.operation()?;
        let project = op
            .run_store(op.db().projects().find_by_owner_and_number(&self.0.id, number))
            .await
            .gql()?;
        Ok(project.map(ProjectV2))
    }

    /// Projects owned by the user
    #[graphql(
        name = "projectV2s",
        complexity = "estimate_cost(first, last, child_complexity)"
    )]
    async fn project_v2s(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<ProjectV2Connection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().projects(),
            ProjectRecord::owned_by(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            ProjectV2,
        )
        .await?;
        Ok(ProjectV2Connection::from_connection(conn))
    }
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Debug, Clone)]
pub struct Repository(pub RepositoryRecord);

#[Object]
impl Repository {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn owner(&self, ctx: &Context<'_>) -> Result<User> {
        let op = ctx.operation()?;
        let owner = op.loaders().users.load(&self.0.owner_id).await.gql()?;
        Ok(User(owner))
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    /// One issue of the repository, by number
    async fn issue(&self, ctx: &Context<'_>, number: i32) -> Result<Option<Issue>> {
        let op = ctx.operation()?;
        let issue = op
            .run_store(op.db().issues().find_by_repository_and_number(&self.0.id, number))
            .await
            .gql()?;
        Ok(issue.map(Issue))
    }

    #[graphql(complexity = "estimate_cost(first, last, child_complexity)")]
    async fn issues(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<IssueConnection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().issues(),
            IssueRecord::in_repository(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            Issue,
        )
        .await?;
        Ok(IssueConnection::from_connection(conn))
    }

    /// One pull request of the repository, by number
    async fn pull_request(&self, ctx: &Context<'_>, number: i32) -> Result<Option<PullRequest>> {
        let op = ctx.operation()?;
        let pull_request = op
            .run_store(op.db().pull_requests().find_by_repository_and_number(&self.0.id, number))
            .await
            .gql()?;
        Ok(pull_request.map(PullRequest))
    }

    #[graphql(complexity = "estimate_cost(first, last, child_complexity)")]
    async fn pull_requests(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<PullRequestConnection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().pull_requests(),
            PullRequestRecord::in_repository(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            PullRequest,
        )
        .await?;
        Ok(PullRequestConnection::from_connection(conn))
    }
}

// ============================================================================
// Issue
// ============================================================================

#[derive(Debug, Clone)]
pub struct Issue(pub IssueRecord);

#[Object]
impl Issue {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn url(&self) -> &str {
        &self.0.url
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn closed(&self) -> bool {
        self.0.closed
    }

    async fn number(&self) -> i32 {
        self.0.number
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<User> {
        let op = ctx.operation()?;
        let author = op.loaders().users.load(&self.0.author_id).await.gql()?;
        Ok(User(author))
    }

    async fn repository(&self, ctx: &Context<'_>) -> Result<Repository> {
        let op = ctx.operation()?;
        let repository = op
            .loaders()
            .repositories
            .load(&self.0.repository_id)
            .await
            .gql()?;
        Ok(Repository(repository))
    }

    /// Project items that reference this issue
    #[graphql(complexity = "estimate_cost(first, last, child_complexity)")]
    async fn project_items(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<ProjectV2ItemConnection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().project_items(),
            ProjectItemRecord::for_issue(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            ProjectV2Item,
        )
        .await?;
        Ok(ProjectV2ItemConnection::from_connection(conn))
    }
}

// ============================================================================
// Pull Request
// ============================================================================

#[derive(Debug, Clone)]
pub struct PullRequest(pub PullRequestRecord);

#[Object]
impl PullRequest {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn base_ref_name(&self) -> &str {
        &self.0.base_ref_name
    }

    async fn head_ref_name(&self) -> &str {
        &self.0.head_ref_name
    }

    async fn closed(&self) -> bool {
        self.0.closed
    }

    async fn url(&self) -> &str {
        &self.0.url
    }

    async fn number(&self) -> i32 {
        self.0.number
    }

    async fn repository(&self, ctx: &Context<'_>) -> Result<Repository> {
        let op = ctx.operation()?;
        let repository = op
            .loaders()
            .repositories
            .load(&self.0.repository_id)
            .await
            .gql()?;
        Ok(Repository(repository))
    }

    /// Project items that reference this pull request
    #[graphql(complexity = "estimate_cost(first, last, child_complexity)")]
    async fn project_items(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<ProjectV2ItemConnection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().project_items(),
            ProjectItemRecord::for_pull_request(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            ProjectV2Item,
        )
        .await?;
        Ok(ProjectV2ItemConnection::from_connection(conn))
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProjectV2(pub ProjectRecord);

#[Object]
impl ProjectV2 {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn url(&self) -> &str {
        &self.0.url
    }

    async fn number(&self) -> i32 {
        self.0.number
    }

    async fn owner(&self, ctx: &Context<'_>) -> Result<User> {
        let op = ctx.operation()?;
        let owner = op.loaders().users.load(&self.0.owner_id).await.gql()?;
        Ok(User(owner))
    }

    #[graphql(complexity = "estimate_cost(first, last, child_complexity)")]
    async fn items(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<ProjectV2ItemConnection> {
        let op = ctx.operation()?;
        let conn = connection(
            ctx,
            op.db().project_items(),
            ProjectItemRecord::in_project(&self.0.id),
            ConnectionArgs::new(after, before, first, last),
            ProjectV2Item,
        )
        .await?;
        Ok(ProjectV2ItemConnection::from_connection(conn))
    }
}

/// What a project item points at
#[derive(Union, Debug, Clone)]
pub enum ProjectV2ItemContent {
    Issue(Issue),
    PullRequest(PullRequest),
}

#[derive(Debug, Clone)]
pub struct ProjectV2Item(pub ProjectItemRecord);

#[Object]
impl ProjectV2Item {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn project(&self, ctx: &Context<'_>) -> Result<ProjectV2> {
        let op = ctx.operation()?;
        let project = op
            .loaders()
            .projects
            .load(&self.0.project_id)
            .await
            .gql()?;
        Ok(ProjectV2(project))
    }

    async fn content(&self, ctx: &Context<'_>) -> Result<ProjectV2ItemContent> {
        let op = ctx.operation()?;
        let content = match &self.0.content {
            ProjectItemContent::Issue(id) => {
                ProjectV2ItemContent::Issue(Issue(op.loaders().issues.load(id).await.gql()?))
            }
            ProjectItemContent::PullRequest(id) => ProjectV2ItemContent::PullRequest(PullRequest(
                op.loaders().pull_requests.load(id).await.gql()?,
            )),
        };
        Ok(content)
    }
}

// ============================================================================
// Connections
// ============================================================================

define_connection!(IssueConnection, IssueEdge, Issue);
define_connection!(PullRequestConnection, PullRequestEdge, PullRequest);
define_connection!(ProjectV2Connection, ProjectV2Edge, ProjectV2);
define_connection!(ProjectV2ItemConnection, ProjectV2ItemEdge, ProjectV2Item);

// ============================================================================
// Mutation inputs and payloads
// ============================================================================

#[derive(InputObject, Debug, Clone)]
pub struct AddProjectV2ItemByIdInput {
    /// The project to add the item to
    pub project_id: ID,
    /// An issue or pull request ID
    pub content_id: ID,
}

#[derive(SimpleObject, Debug, Clone)]
pub struct AddProjectV2ItemByIdPayload {
    pub item: ProjectV2Item,
}
