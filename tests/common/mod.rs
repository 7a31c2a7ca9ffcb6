//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use repograph::db::seed::run_seeds;
use repograph::db::{Database, IssueRecord, RepositoryRecord, UserRecord};

/// A fresh in-memory database with every table created.
pub async fn database() -> Database {
    let db = Database::connect_in_memory().await.unwrap();
    db.sync_schema().await.unwrap();
    db
}

/// A fresh database holding the demo dataset.
pub async fn seeded_database() -> Database {
    let db = database().await;
    let result = run_seeds(&db).await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    db
}

pub async fn insert_user(db: &Database, id: &str, name: &str) {
    db.users()
        .insert(&UserRecord {
            id: id.to_string(),
            name: name.to_string(),
        })
        .await
        .unwrap();
}

pub async fn insert_repository(db: &Database, id: &str, owner_id: &str, name: &str) {
    db.repositories()
        .insert(&RepositoryRecord {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();
}

/// Insert issues with the given IDs into a repository, numbered in order.
pub async fn insert_issues(db: &Database, repository_id: &str, author_id: &str, ids: &[&str]) {
    for (i, id) in ids.iter().enumerate() {
        let number = i as i32 + 1;
        db.issues()
            .insert(&IssueRecord {
                id: id.to_string(),
                url: format!("https://example.com/{}/issues/{}", repository_id, number),
                title: format!("Issue {}", id),
                closed: false,
                number,
                repository_id: repository_id.to_string(),
                author_id: author_id.to_string(),
            })
            .await
            .unwrap();
    }
}

/// One user owning `REPO_1` with issues `ISSUE_A` .. `ISSUE_E`, and an
/// empty `REPO_2`.
pub async fn alphabet_database() -> Database {
    let db = database().await;
    insert_user(&db, "U_1", "hsaki").await;
    insert_repository(&db, "REPO_1", "U_1", "repo1").await;
    insert_repository(&db, "REPO_2", "U_1", "repo2").await;
    insert_issues(
        &db,
        "REPO_1",
        "U_1",
        &["ISSUE_A", "ISSUE_B", "ISSUE_C", "ISSUE_D", "ISSUE_E"],
    )
    .await;
    db
}
