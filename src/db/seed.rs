//! Demo dataset for local development.
//!
//! Runs after schema sync when `SEED_DEMO_DATA` is set. Uses INSERT OR IGNORE
//! so re-runs are idempotent (existing rows are preserved).
//!
//! Seeded IDs use the same `<PREFIX>_<hex>` shape as generated ones but with
//! tiny values, so anything created at runtime sorts after the demo rows.

use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::table::{Record, Table};
use super::{
    Database, IssueRecord, ProjectItemContent, ProjectItemRecord, ProjectRecord,
    PullRequestRecord, RepositoryRecord, UserRecord,
};
use crate::error::StoreResult;

/// Result of running seed operations.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub tables_seeded: Vec<String>,
    pub errors: Vec<String>,
}

/// Deterministic demo ID, e.g. `seed_id("U", 1)` = `U_00000000000000000000000000000001`.
pub fn seed_id(prefix: &str, n: u128) -> String {
    format!("{}_{}", prefix, Uuid::from_u128(n).simple())
}

async fn insert_all<E: Record>(table: &Table<E>, rows: &[E]) -> StoreResult<u64> {
    let mut inserted = 0;
    for row in rows {
        if table.insert_or_ignore(row).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

fn user(n: u128) -> String {
    seed_id(UserRecord::ID_PREFIX, n)
}

fn repo(n: u128) -> String {
    seed_id(RepositoryRecord::ID_PREFIX, n)
}

async fn seed_users(db: &Database) -> StoreResult<u64> {
    let rows = [("hsaki", 1), ("octocat", 2)].map(|(name, n)| UserRecord {
        id: user(n),
        name: name.to_string(),
    });
    insert_all(&db.users(), &rows).await
}

async fn seed_repositories(db: &Database) -> StoreResult<u64> {
    let created_at = Utc.with_ymd_and_hms(2022, 12, 30, 0, 12, 21).single();
    let rows: Vec<RepositoryRecord> = [("repo1", 1, 1), ("repo2", 2, 1)]
        .into_iter()
        .filter_map(|(name, n, owner)| {
            Some(RepositoryRecord {
                id: repo(n),
                owner_id: user(owner),
                name: name.to_string(),
                created_at: created_at?,
            })
        })
        .collect();
    insert_all(&db.repositories(), &rows).await
}

async fn seed_issues(db: &Database) -> StoreResult<u64> {
    let titles = [
        "First issue",
        "Second issue",
        "Third issue",
        "Fourth issue",
        "Fifth issue",
    ];
    let rows: Vec<IssueRecord> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let number = i as i32 + 1;
            IssueRecord {
                id: seed_id(IssueRecord::ID_PREFIX, number as u128),
                url: format!("https://github.com/hsaki/repo1/issues/{}", number),
                title: title.to_string(),
                closed: number <= 2,
                number,
                repository_id: repo(1),
                author_id: user(if number % 2 == 0 { 2 } else { 1 }),
            }
        })
        .collect();
    insert_all(&db.issues(), &rows).await
}

async fn seed_pull_requests(db: &Database) -> StoreResult<u64> {
    let rows: Vec<PullRequestRecord> = [("feature/login", 1), ("fix/typo", 2), ("docs/readme", 3)]
        .into_iter()
        .map(|(head, number)| PullRequestRecord {
            id: seed_id(PullRequestRecord::ID_PREFIX, number as u128),
            base_ref_name: "main".to_string(),
            head_ref_name: head.to_string(),
            closed: number == 1,
            url: format!("https://github.com/hsaki/repo1/pull/{}", number),
            number,
            repository_id: repo(1),
        })
        .collect();
    insert_all(&db.pull_requests(), &rows).await
}

async fn seed_projects(db: &Database) -> StoreResult<u64> {
    let rows = [ProjectRecord {
        id: seed_id(ProjectRecord::ID_PREFIX, 1),
        title: "My Project".to_string(),
        url: "https://github.com/users/hsaki/projects/1".to_string(),
        number: 1,
        owner_id: user(1),
    }];
    insert_all(&db.projects(), &rows).await
}

async fn seed_project_items(db: &Database) -> StoreResult<u64> {
    let project_id = seed_id(ProjectRecord::ID_PREFIX, 1);
    let contents = [
        ProjectItemContent::Issue(seed_id(IssueRecord::ID_PREFIX, 1)),
        ProjectItemContent::PullRequest(seed_id(PullRequestRecord::ID_PREFIX, 1)),
        ProjectItemContent::Issue(seed_id(IssueRecord::ID_PREFIX, 2)),
    ];
    let rows: Vec<ProjectItemRecord> = contents
        .into_iter()
        .zip(1u128..)
        .map(|(content, n)| ProjectItemRecord {
            id: seed_id(ProjectItemRecord::ID_PREFIX, n),
            project_id: project_id.clone(),
            content,
        })
        .collect();
    insert_all(&db.project_items(), &rows).await
}

/// Run all seed routines. Safe to call multiple times (uses INSERT OR IGNORE).
pub async fn run_seeds(db: &Database) -> SeedResult {
    let mut result = SeedResult::default();

    // Parents before children; each step needs the rows of the previous ones.
    for (table, count) in [
        ("users", seed_users(db).await),
        ("repositories", seed_repositories(db).await),
        ("issues", seed_issues(db).await),
        ("pull_requests", seed_pull_requests(db).await),
        ("projects", seed_projects(db).await),
        ("project_items", seed_project_items(db).await),
    ] {
        match count {
            Ok(n) => {
                if n > 0 {
                    debug!(table = table, count = n, "Seeded table");
                    result.tables_seeded.push(format!("{} ({} rows)", table, n));
                }
            }
            Err(e) => {
                let msg = format!("Seed {}: {}", table, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    if !result.tables_seeded.is_empty() {
        info!(tables = ?result.tables_seeded, "Demo data applied");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ids_sort_before_generated_ids() {
        use crate::db::{IdGenerator, SortableIdGenerator};

        let seeded = seed_id("PVTI", 3);
        let generated = SortableIdGenerator::new().next_id("PVTI");
        assert!(seeded < generated);
        assert_eq!(seed_id("U", 1), "U_00000000000000000000000000000001");
    }

    #[tokio::test]
    async fn test_seeds_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.sync_schema().await.unwrap();

        let first = run_seeds(&db).await;
        assert!(first.errors.is_empty(), "{:?}", first.errors);
        assert_eq!(first.tables_seeded.len(), 6);

        let second = run_seeds(&db).await;
        assert!(second.errors.is_empty(), "{:?}", second.errors);
        assert!(second.tables_seeded.is_empty());

        let owner = db.users().find_by_name("hsaki").await.unwrap().unwrap();
        assert_eq!(owner.id, user(1));
    }
}
