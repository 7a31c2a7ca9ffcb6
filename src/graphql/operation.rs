//! Per-request operation scope
//!
//! An [`Operation`] is created by the HTTP handler for every GraphQL request
//! and inserted into the request data. It owns the request's loaders and
//! its cancellation token; dropping it (request finished, timed out, or the
//! client went away) cancels everything still in flight.

use std::future::Future;

use async_graphql::{Context, ErrorExtensions};
use tokio_util::sync::CancellationToken;

use super::loaders::{BatchLoader, LoaderSettings};
use super::pagination::{ConnectionArgs, KeysetSource, Page, paginate};
use crate::db::{
    Database, IssueRecord, ProjectItemRecord, ProjectRecord, PullRequestRecord, RepositoryRecord,
    Table, UserRecord,
};
use crate::error::{ResolveError, StoreResult};

/// One batch loader per entity table.
pub struct Loaders {
    pub users: BatchLoader<Table<UserRecord>>,
    pub repositories: BatchLoader<Table<RepositoryRecord>>,
    pub issues: BatchLoader<Table<IssueRecord>>,
    pub pull_requests: BatchLoader<Table<PullRequestRecord>>,
    pub projects: BatchLoader<Table<ProjectRecord>>,
    pub project_items: BatchLoader<Table<ProjectItemRecord>>,
}

impl Loaders {
    fn new(db: &Database, settings: LoaderSettings, cancel: &CancellationToken) -> Self {
        Self {
            users: BatchLoader::new(db.users(), settings, cancel.clone()),
            repositories: BatchLoader::new(db.repositories(), settings, cancel.clone()),
            issues: BatchLoader::new(db.issues(), settings, cancel.clone()),
            pull_requests: BatchLoader::new(db.pull_requests(), settings, cancel.clone()),
            projects: BatchLoader::new(db.projects(), settings, cancel.clone()),
            project_items: BatchLoader::new(db.project_items(), settings, cancel.clone()),
        }
    }
}

pub struct Operation {
    db: Database,
    loaders: Loaders,
    cancel: CancellationToken,
}

impl Operation {
    pub fn new(db: &Database, settings: LoaderSettings) -> Self {
        let cancel = CancellationToken::new();
        Self {
            db: db.clone(),
            loaders: Loaders::new(db, settings, &cancel),
            cancel,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn loaders(&self) -> &Loaders {
        &self.loaders
    }

    /// Token cancelled when this operation ends or is aborted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a store call, abandoning it if the operation is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResolveError::Cancelled),
            result = fut => result,
        }
    }

    /// [`Operation::run`] for a plain store call.
    pub async fn run_store<T, F>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.run(async { fut.await.map_err(ResolveError::from) }).await
    }

    /// One connection page, cancellable with the operation.
    pub async fn page<S>(
        &self,
        source: &S,
        scope: &S::Scope,
        args: &ConnectionArgs,
    ) -> Result<Page<S::Node>, ResolveError>
    where
        S: KeysetSource + ?Sized,
    {
        self.run(paginate(source, scope, args)).await
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Access to the current request's [`Operation`] from a resolver.
pub trait OperationExt {
    fn operation(&self) -> async_graphql::Result<&Operation>;
}

impl<'a> OperationExt for Context<'a> {
    fn operation(&self) -> async_graphql::Result<&Operation> {
        self.data_opt::<Operation>().ok_or_else(|| {
            async_graphql::Error::new("No operation scope for this request")
                .extend_with(|_, e| e.set("code", "INTERNAL"))
        })
    }
}

/// Turn a [`ResolveError`] into a GraphQL error carrying its code.
pub trait ResolveResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> ResolveResultExt<T> for Result<T, ResolveError> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Duration;

    async fn operation() -> Operation {
        let db = Database::connect_in_memory().await.unwrap();
        db.sync_schema().await.unwrap();
        db.users()
            .insert(&UserRecord {
                id: "U_1".into(),
                name: "hsaki".into(),
            })
            .await
            .unwrap();
        Operation::new(&db, LoaderSettings::default())
    }

    #[tokio::test]
    async fn test_loaders_read_the_database() {
        let op = operation().await;

        let user = op.loaders().users.load("U_1").await.unwrap();
        assert_eq!(user.name, "hsaki");
        assert_matches!(
            op.loaders().users.load("U_2").await,
            Err(ResolveError::NotFound { entity: "User", .. })
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let op = operation().await;
        let token = op.cancellation_token();

        let never = futures::future::pending::<Result<(), ResolveError>>();
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        };
        let (result, ()) = tokio::join!(op.run(never), canceller);

        assert_matches!(result, Err(ResolveError::Cancelled));
        assert!(op.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let op = operation().await;
        let token = op.cancellation_token();
        drop(op);
        assert!(token.is_cancelled());
    }
}
