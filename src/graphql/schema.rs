//! GraphQL schema definition with queries and mutations
//!
//! Reads are open to anonymous callers; the single mutation requires a token.

use async_graphql::{Context, EmptySubscription, ErrorExtensions, ID, Object, Result, Schema};

use super::auth::{AuthExt, AuthGuard};
use super::operation::{OperationExt, ResolveResultExt};
use super::types::*;
use crate::db::{
    IssueRecord, ProjectItemContent, ProjectItemRecord, ProjectRecord, PullRequestRecord,
    RepositoryRecord, UserRecord,
};
use crate::error::ResolveError;

/// The GraphQL schema type
pub type RepographSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Nesting limit for any operation.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Build the GraphQL schema with all resolvers
///
/// Operations whose estimated cost exceeds `complexity_limit` are rejected
/// before execution.
pub fn build_schema(complexity_limit: usize) -> RepographSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .limit_complexity(complexity_limit)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

// ============================================================================
// Query Root
// ============================================================================

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Look up a repository by owner name and repository name
    async fn repository(
        &self,
        ctx: &Context<'_>,
        owner: String,
        name: String,
    ) -> Result<Option<Repository>> {
        let op = ctx.operation()?;
        let repository = op
            .run_store(op.db().repositories().find_by_owner_and_name(&owner, &name))
            .await
            .gql()?;
        Ok(repository.map(Repository))
    }

    /// Look up a user by name
    async fn user(&self, ctx: &Context<'_>, name: String) -> Result<Option<User>> {
        let op = ctx.operation()?;
        let user = op
            .run_store(op.db().users().find_by_name(&name))
            .await
            .gql()?;
        Ok(user.map(User))
    }

    /// Fetch any object by its global ID
    #[graphql(complexity = 1)]
    async fn node(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Node>> {
        let op = ctx.operation()?;
        let loaders = op.loaders();
        let key = id.as_str();

        let node = match id_prefix(key) {
            Some(UserRecord::ID_PREFIX) => loaders.users.load(key).await.map(|r| Node::User(User(r))),
            Some(RepositoryRecord::ID_PREFIX) => loaders
                .repositories
                .load(key)
                .await
                .map(|r| Node::Repository(Repository(r))),
            Some(IssueRecord::ID_PREFIX) => {
                loaders.issues.load(key).await.map(|r| Node::Issue(Issue(r)))
            }
            Some(PullRequestRecord::ID_PREFIX) => loaders
                .pull_requests
                .load(key)
                .await
                .map(|r| Node::PullRequest(PullRequest(r))),
            Some(ProjectRecord::ID_PREFIX) => loaders
                .projects
                .load(key)
                .await
                .map(|r| Node::ProjectV2(ProjectV2(r))),
            Some(ProjectItemRecord::ID_PREFIX) => loaders
                .project_items
                .load(key)
                .await
                .map(|r| Node::ProjectV2Item(ProjectV2Item(r))),
            _ => Err(ResolveError::InvalidArguments(format!(
                "unrecognized node id: {}",
                key
            ))),
        };

        match node {
            Ok(node) => Ok(Some(node)),
            Err(ResolveError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.extend()),
        }
    }
}

// ============================================================================
// Mutation Root
// ============================================================================

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Add an issue or pull request to a project
    #[graphql(name = "addProjectV2ItemById", guard = "AuthGuard")]
    async fn add_project_v2_item_by_id(
        &self,
        ctx: &Context<'_>,
        input: AddProjectV2ItemByIdInput,
    ) -> Result<AddProjectV2ItemByIdPayload> {
        let user = ctx.auth_user()?;
        let op = ctx.operation()?;
        let loaders = op.loaders();

        let project = loaders
            .projects
            .load(input.project_id.as_str())
            .await
            .gql()?;

        let content_id = input.content_id.as_str();
        let content = match id_prefix(content_id) {
            Some(IssueRecord::ID_PREFIX) => {
                ProjectItemContent::Issue(loaders.issues.load(content_id).await.gql()?.id)
            }
            Some(PullRequestRecord::ID_PREFIX) => ProjectItemContent::PullRequest(
                loaders.pull_requests.load(content_id).await.gql()?.id,
            ),
            _ => {
                return Err(ResolveError::InvalidArguments(format!(
                    "content must be an issue or pull request: {}",
                    content_id
                ))
                .extend());
            }
        };

        let item = op
            .run_store(op.db().project_items().add_project_item(&project.id, content))
            .await
            .gql()?;

        tracing::info!(
            user = %user.name,
            project_id = %project.id,
            item_id = %item.id,
            "Project item added"
        );

        Ok(AddProjectV2ItemByIdPayload {
            item: ProjectV2Item(item),
        })
    }
}
