//! Keyset pagination against SQLite
//!
//! Issues `ISSUE_A` .. `ISSUE_E` live in `REPO_1`; `REPO_2` starts empty.

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use repograph::db::{Database, IssueRecord};
use repograph::error::ResolveError;
use repograph::graphql::pagination::{Connection, ConnectionArgs, Page, paginate};

fn args(
    after: Option<&str>,
    before: Option<&str>,
    first: Option<i32>,
    last: Option<i32>,
) -> ConnectionArgs {
    ConnectionArgs::new(
        after.map(String::from),
        before.map(String::from),
        first,
        last,
    )
}

async fn page(db: &Database, repository_id: &str, args: ConnectionArgs) -> Page<IssueRecord> {
    paginate(&db.issues(), &IssueRecord::in_repository(repository_id), &args)
        .await
        .unwrap()
}

fn ids(page: &Page<IssueRecord>) -> Vec<&str> {
    page.records.iter().map(|r| r.id.as_str()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_after_with_first() {
    let db = common::alphabet_database().await;

    let page = page(&db, "REPO_1", args(Some("ISSUE_B"), None, Some(2), None)).await;

    assert_eq!(ids(&page), vec!["ISSUE_C", "ISSUE_D"]);
    assert!(page.has_previous_page);
    assert!(page.has_next_page);
}

#[tokio::test]
async fn test_before_with_last() {
    let db = common::alphabet_database().await;

    let page = page(&db, "REPO_1", args(None, Some("ISSUE_D"), None, Some(2))).await;

    assert_eq!(ids(&page), vec!["ISSUE_B", "ISSUE_C"]);
    assert!(page.has_previous_page);
    assert!(page.has_next_page);
}

#[tokio::test]
async fn test_empty_scope() {
    let db = common::alphabet_database().await;

    let page = page(&db, "REPO_2", ConnectionArgs::default()).await;
    let conn = Connection::assemble(page);

    assert_eq!(conn.total_count, 0);
    assert!(conn.edges.is_empty());
    assert!(conn.nodes.is_empty());
    assert_eq!(conn.page_info.start_cursor, None);
    assert_eq!(conn.page_info.end_cursor, None);
    assert!(!conn.page_info.has_previous_page);
    assert!(!conn.page_info.has_next_page);
}

#[tokio::test]
async fn test_first_page_and_last_page() {
    let db = common::alphabet_database().await;

    let head = page(&db, "REPO_1", args(None, None, Some(2), None)).await;
    assert_eq!(ids(&head), vec!["ISSUE_A", "ISSUE_B"]);
    assert!(!head.has_previous_page);
    assert!(head.has_next_page);

    let tail = page(&db, "REPO_1", args(None, None, None, Some(2))).await;
    assert_eq!(ids(&tail), vec!["ISSUE_D", "ISSUE_E"]);
    assert!(tail.has_previous_page);
    assert!(!tail.has_next_page);
}

#[tokio::test]
async fn test_last_wins_without_cursors() {
    let db = common::alphabet_database().await;

    let page = page(&db, "REPO_1", args(None, None, Some(3), Some(1))).await;

    assert_eq!(ids(&page), vec!["ISSUE_E"]);
}

#[tokio::test]
async fn test_both_cursors_ignore_limits() {
    let db = common::alphabet_database().await;

    let page = page(
        &db,
        "REPO_1",
        args(Some("ISSUE_A"), Some("ISSUE_E"), Some(1), Some(1)),
    )
    .await;

    assert_eq!(ids(&page), vec!["ISSUE_B", "ISSUE_C", "ISSUE_D"]);
    assert!(page.has_previous_page);
    assert!(page.has_next_page);
}

#[tokio::test]
async fn test_walk_forward_visits_every_record_once() {
    let db = common::alphabet_database().await;

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = page(
            &db,
            "REPO_1",
            ConnectionArgs::new(cursor.clone(), None, Some(2), None),
        )
        .await;
        seen.extend(page.records.iter().map(|r| r.id.clone()));
        if !page.has_next_page {
            break;
        }
        cursor = page.records.last().map(|r| r.id.clone());
    }

    assert_eq!(
        seen,
        vec!["ISSUE_A", "ISSUE_B", "ISSUE_C", "ISSUE_D", "ISSUE_E"]
    );
}

// ============================================================================
// Scope
// ============================================================================

#[tokio::test]
async fn test_flags_ignore_other_scopes() {
    let db = common::alphabet_database().await;
    // Sort before and after every REPO_1 issue.
    common::insert_issues(&db, "REPO_2", "U_1", &["ISSUE_0", "ISSUE_Z"]).await;

    let page = page(&db, "REPO_1", ConnectionArgs::default()).await;

    assert_eq!(page.records.len(), 5);
    assert!(!page.has_previous_page);
    assert!(!page.has_next_page);
    assert!(page.records.iter().all(|r| r.repository_id == "REPO_1"));
}

#[tokio::test]
async fn test_cursor_from_another_scope_bounds_the_range() {
    let db = common::alphabet_database().await;
    common::insert_issues(&db, "REPO_2", "U_1", &["ISSUE_BB"]).await;

    let page = page(&db, "REPO_1", args(Some("ISSUE_BB"), None, Some(10), None)).await;

    assert_eq!(ids(&page), vec!["ISSUE_C", "ISSUE_D", "ISSUE_E"]);
    assert!(page.has_previous_page);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_non_positive_limits_are_rejected() {
    let db = common::alphabet_database().await;
    let scope = IssueRecord::in_repository("REPO_1");

    for bad in [args(None, None, Some(0), None), args(None, None, None, Some(-3))] {
        assert_matches!(
            paginate(&db.issues(), &scope, &bad).await,
            Err(ResolveError::InvalidArguments(_))
        );
    }
}

#[tokio::test]
async fn test_store_failure_is_upstream() {
    let db = common::alphabet_database().await;
    db.pool().close().await;

    let result = paginate(
        &db.issues(),
        &IssueRecord::in_repository("REPO_1"),
        &ConnectionArgs::default(),
    )
    .await;

    assert_matches!(result, Err(ResolveError::Upstream(_)));
}

// ============================================================================
// Assembly
// ============================================================================

#[tokio::test]
async fn test_assembled_connection_uses_ids_as_cursors() {
    let db = common::alphabet_database().await;

    let page = page(&db, "REPO_1", args(Some("ISSUE_A"), None, Some(3), None)).await;
    let conn = Connection::assemble(page);

    assert_eq!(conn.total_count, 3);
    let cursors: Vec<&str> = conn.edges.iter().map(|e| e.cursor.as_str()).collect();
    assert_eq!(cursors, vec!["ISSUE_B", "ISSUE_C", "ISSUE_D"]);
    assert_eq!(conn.page_info.start_cursor.as_deref(), Some("ISSUE_B"));
    assert_eq!(conn.page_info.end_cursor.as_deref(), Some("ISSUE_D"));
    assert_eq!(
        conn.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        cursors
    );
}
