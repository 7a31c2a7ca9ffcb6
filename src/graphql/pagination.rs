//! Keyset cursor pagination
//!
//! Every list field in the schema pages through records ordered by their
//! identifier. A cursor is the identifier of the record at the edge of the
//! page, so paging never skips or repeats records when rows are inserted
//! between requests.
//!
//! - [`FetchPlan`] turns `(after, before, first, last)` into a bounded scan
//! - [`paginate`] runs the scan against a [`KeysetSource`] and probes for
//!   neighbours to fill in the page flags
//! - [`Connection::assemble`] shapes the page into edges, nodes and `pageInfo`
//!
//! Usage: use the `define_connection!` macro to create type-specific connections.

use async_graphql::SimpleObject;
use async_trait::async_trait;

use crate::db::orm::SortDirection;
use crate::error::{ResolveError, StoreResult};

// ============================================================================
// Keys and ranges
// ============================================================================

/// A record with a totally ordered string identifier.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Open interval over identifiers. `None` bounds are unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    /// Exclusive lower bound
    pub after: Option<String>,
    /// Exclusive upper bound
    pub before: Option<String>,
}

impl KeyRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Identifiers strictly greater than `key`.
    pub fn above(key: impl Into<String>) -> Self {
        Self {
            after: Some(key.into()),
            before: None,
        }
    }

    /// Identifiers strictly smaller than `key`.
    pub fn below(key: impl Into<String>) -> Self {
        Self {
            after: None,
            before: Some(key.into()),
        }
    }

    pub fn between(after: impl Into<String>, before: impl Into<String>) -> Self {
        Self {
            after: Some(after.into()),
            before: Some(before.into()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.after.as_deref().is_none_or(|after| key > after)
            && self.before.as_deref().is_none_or(|before| key < before)
    }
}

/// Ordered, scoped access to one kind of record.
///
/// `Scope` restricts every call to the records of one parent (e.g. the issues
/// of one repository). `fetch` and `exists` must apply the same scope.
#[async_trait]
pub trait KeysetSource: Send + Sync {
    type Node: Keyed + Send;
    type Scope: Send + Sync;

    /// Records in `range`, ordered by identifier in `order`, at most `limit`.
    async fn fetch(
        &self,
        scope: &Self::Scope,
        range: &KeyRange,
        order: SortDirection,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Self::Node>>;

    /// Whether any record of the scope lies in `range`.
    async fn exists(&self, scope: &Self::Scope, range: &KeyRange) -> StoreResult<bool>;
}

// ============================================================================
// Arguments and plan
// ============================================================================

/// The four standard connection arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub after: Option<String>,
    pub before: Option<String>,
    pub first: Option<i32>,
    pub last: Option<i32>,
}

impl ConnectionArgs {
    pub fn new(
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Self {
        Self {
            after,
            before,
            first,
            last,
        }
    }

    /// `first`/`last` must be positive when given.
    pub fn validate(&self) -> Result<(), ResolveError> {
        for (name, value) in [("first", self.first), ("last", self.last)] {
            if let Some(n) = value
                && n <= 0
            {
                return Err(ResolveError::InvalidArguments(format!(
                    "`{}` must be a positive integer, got {}",
                    name, n
                )));
            }
        }
        Ok(())
    }
}

/// The single scan that answers a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub range: KeyRange,
    pub order: SortDirection,
    pub limit: Option<u64>,
}

impl FetchPlan {
    /// Choose the scan for a set of arguments.
    ///
    /// With both cursors the limits are ignored and the whole range between
    /// them is returned. A descending scan is reversed by the caller.
    pub fn from_args(args: &ConnectionArgs) -> Result<Self, ResolveError> {
        args.validate()?;

        let first = args.first.map(|n| n as u64);
        let last = args.last.map(|n| n as u64);

        let plan = match (&args.after, &args.before) {
            (Some(after), Some(before)) => Self {
                range: KeyRange::between(after.clone(), before.clone()),
                order: SortDirection::Asc,
                limit: None,
            },
            (Some(after), None) => Self {
                range: KeyRange::above(after.clone()),
                order: SortDirection::Asc,
                limit: first,
            },
            (None, Some(before)) => Self {
                range: KeyRange::below(before.clone()),
                order: SortDirection::Desc,
                limit: last,
            },
            (None, None) => match (first, last) {
                (_, Some(last)) => Self {
                    range: KeyRange::unbounded(),
                    order: SortDirection::Desc,
                    limit: Some(last),
                },
                (first, None) => Self {
                    range: KeyRange::unbounded(),
                    order: SortDirection::Asc,
                    limit: first,
                },
            },
        };

        Ok(plan)
    }
}

// ============================================================================
// Paginate
// ============================================================================

/// An ascending slice of records plus neighbour flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            has_previous_page: false,
            has_next_page: false,
        }
    }
}

/// Fetch one page of `scope` from `source`.
///
/// Flags come from two existence probes around the final slice, not from
/// the arguments: `hasPreviousPage` is true iff the scope holds a record
/// before the first returned one, `hasNextPage` iff it holds one after the last.
pub async fn paginate<S>(
    source: &S,
    scope: &S::Scope,
    args: &ConnectionArgs,
) -> Result<Page<S::Node>, ResolveError>
where
    S: KeysetSource + ?Sized,
{
    let plan = FetchPlan::from_args(args)?;

    tracing::debug!(
        after = ?plan.range.after,
        before = ?plan.range.before,
        order = plan.order.to_sql(),
        limit = ?plan.limit,
        "Fetching keyset page"
    );

    let mut records = source
        .fetch(scope, &plan.range, plan.order, plan.limit)
        .await?;
    if plan.order == SortDirection::Desc {
        records.reverse();
    }

    let (before_start, after_end) = match (records.first(), records.last()) {
        (Some(start), Some(end)) => (KeyRange::below(start.key()), KeyRange::above(end.key())),
        _ => return Ok(Page::empty()),
    };

    let (has_previous_page, has_next_page) = tokio::try_join!(
        source.exists(scope, &before_start),
        source.exists(scope, &after_end)
    )?;

    Ok(Page {
        records,
        has_previous_page,
        has_next_page,
    })
}

// ============================================================================
// Connection
// ============================================================================

/// Information about pagination in a connection
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Cursor of the first item in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page
    pub end_cursor: Option<String>,
    /// Does the scope hold items before this page?
    pub has_previous_page: bool,
    /// Does the scope hold items after this page?
    pub has_next_page: bool,
}

/// An edge in a connection (internal use)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

/// A page shaped for GraphQL (internal use)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub nodes: Vec<T>,
    pub total_count: usize,
    pub page_info: PageInfo,
}

impl<T: Keyed + Clone> Connection<T> {
    /// Build edges, nodes and page info from a page. `total_count` is the
    /// size of this page, not of the whole scope.
    pub fn assemble(page: Page<T>) -> Self {
        let edges: Vec<Edge<T>> = page
            .records
            .into_iter()
            .map(|node| Edge {
                cursor: node.key().to_string(),
                node,
            })
            .collect();

        let page_info = PageInfo {
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            has_previous_page: page.has_previous_page,
            has_next_page: page.has_next_page,
        };

        Self {
            nodes: edges.iter().map(|e| e.node.clone()).collect(),
            total_count: edges.len(),
            edges,
            page_info,
        }
    }
}

impl<T> Connection<T> {
    /// Convert every node, keeping cursors and page info.
    pub fn map<U: Clone>(self, mut f: impl FnMut(T) -> U) -> Connection<U> {
        let edges: Vec<Edge<U>> = self
            .edges
            .into_iter()
            .map(|e| Edge {
                cursor: e.cursor,
                node: f(e.node),
            })
            .collect();

        Connection {
            nodes: edges.iter().map(|e| e.node.clone()).collect(),
            total_count: self.total_count,
            edges,
            page_info: self.page_info,
        }
    }
}

/// Macro to define a GraphQL connection type for a specific node type
///
/// Usage:
/// ```ignore
/// define_connection!(IssueConnection, IssueEdge, Issue);
/// ```
#[macro_export]
macro_rules! define_connection {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            /// A cursor for pagination
            pub cursor: String,
            /// The item at the end of the edge
            pub node: $node_type,
        }

        /// Connection containing edges, nodes and page info
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $conn_name {
            /// The edges in this connection
            pub edges: Vec<$edge_name>,
            /// The nodes of the edges, in the same order
            pub nodes: Vec<$node_type>,
            /// Pagination information
            pub page_info: $crate::graphql::pagination::PageInfo,
            /// Number of items in this page
            pub total_count: i32,
        }

        impl $conn_name {
            /// Create from a generic Connection
            pub fn from_connection(
                conn: $crate::graphql::pagination::Connection<$node_type>,
            ) -> Self {
                Self {
                    total_count: i32::try_from(conn.total_count).unwrap_or(i32::MAX),
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge_name {
                            cursor: e.cursor,
                            node: e.node,
                        })
                        .collect(),
                    nodes: conn.nodes,
                    page_info: conn.page_info,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row(String);

    impl Keyed for Row {
        fn key(&self) -> &str {
            &self.0
        }
    }

    /// Rows grouped by scope name, scanned in memory.
    #[derive(Default)]
    struct MemorySource {
        scopes: HashMap<&'static str, Vec<&'static str>>,
        fetches: AtomicUsize,
        probes: AtomicUsize,
        fail: bool,
    }

    impl MemorySource {
        fn with(scope: &'static str, ids: &[&'static str]) -> Self {
            let mut source = Self::default();
            source.scopes.insert(scope, ids.to_vec());
            source
        }

        fn scan(&self, scope: &str, range: &KeyRange) -> Vec<&'static str> {
            let mut ids: Vec<&'static str> = self
                .scopes
                .get(scope)
                .map(|ids| ids.iter().copied().filter(|id| range.contains(id)).collect())
                .unwrap_or_default();
            ids.sort();
            ids
        }
    }

    #[async_trait]
    impl KeysetSource for MemorySource {
        type Node = Row;
        type Scope = &'static str;

        async fn fetch(
            &self,
            scope: &Self::Scope,
            range: &KeyRange,
            order: SortDirection,
            limit: Option<u64>,
        ) -> StoreResult<Vec<Row>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Conflict("scan failed".into()));
            }
            let mut ids = self.scan(scope, range);
            if order == SortDirection::Desc {
                ids.reverse();
            }
            let limit = limit.map(|n| n as usize).unwrap_or(usize::MAX);
            Ok(ids
                .into_iter()
                .take(limit)
                .map(|id| Row(id.to_string()))
                .collect())
        }

        async fn exists(&self, scope: &Self::Scope, range: &KeyRange) -> StoreResult<bool> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(!self.scan(scope, range).is_empty())
        }
    }

    fn args(after: Option<&str>, before: Option<&str>, first: Option<i32>, last: Option<i32>) -> ConnectionArgs {
        ConnectionArgs::new(
            after.map(String::from),
            before.map(String::from),
            first,
            last,
        )
    }

    fn keys(page: &Page<Row>) -> Vec<&str> {
        page.records.iter().map(|r| r.key()).collect()
    }

    const LETTERS: &[&str] = &["A", "B", "C", "D", "E"];

    #[tokio::test]
    async fn test_after_with_first() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(Some("B"), None, Some(2), None))
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["C", "D"]);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn test_before_with_last_is_reversed() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(None, Some("D"), None, Some(2)))
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["B", "C"]);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn test_empty_scope_skips_probes() {
        let source = MemorySource::default();
        let page = paginate(&source, &"repo", &ConnectionArgs::default())
            .await
            .unwrap();

        assert_eq!(page, Page::empty());
        assert_eq!(source.probes.load(Ordering::SeqCst), 0);

        let conn = Connection::assemble(page);
        assert_eq!(conn.total_count, 0);
        assert_eq!(conn.page_info, PageInfo::default());
    }

    #[tokio::test]
    async fn test_no_arguments_returns_everything() {
        let source = MemorySource::with("repo", &["C", "A", "E", "B", "D"]);
        let page = paginate(&source, &"repo", &ConnectionArgs::default())
            .await
            .unwrap();

        assert_eq!(keys(&page), LETTERS.to_vec());
        assert!(!page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn test_last_wins_over_first_without_cursors() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(None, None, Some(1), Some(2)))
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["D", "E"]);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn test_first_without_cursors() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(None, None, Some(3), None))
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["A", "B", "C"]);
        assert!(!page.has_previous_page);
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn test_both_cursors_ignore_limits() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(Some("A"), Some("E"), Some(1), Some(1)))
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["B", "C", "D"]);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn test_flags_ignore_other_scopes() {
        let mut source = MemorySource::with("repo-1", &["B", "C"]);
        source.scopes.insert("repo-2", vec!["A", "D"]);

        let page = paginate(&source, &"repo-1", &ConnectionArgs::default())
            .await
            .unwrap();

        assert_eq!(keys(&page), vec!["B", "C"]);
        assert!(!page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn test_cursor_past_the_end() {
        let source = MemorySource::with("repo", LETTERS);
        let page = paginate(&source, &"repo", &args(Some("E"), None, Some(2), None))
            .await
            .unwrap();

        assert!(page.records.is_empty());
        assert!(!page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn test_non_positive_limits_are_rejected() {
        let source = MemorySource::with("repo", LETTERS);

        for bad in [args(None, None, Some(0), None), args(None, None, None, Some(-3))] {
            let err = paginate(&source, &"repo", &bad).await.unwrap_err();
            assert_matches!(err, ResolveError::InvalidArguments(_));
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_upstream() {
        let source = MemorySource {
            fail: true,
            ..MemorySource::default()
        };
        let err = paginate(&source, &"repo", &ConnectionArgs::default())
            .await
            .unwrap_err();
        assert_matches!(err, ResolveError::Upstream(_));
    }

    #[tokio::test]
    async fn test_pages_are_ordered_bounded_and_flagged() {
        let source = MemorySource::with("repo", LETTERS);
        let cursors = [None, Some("A"), Some("C"), Some("E")];
        let limits = [None, Some(1), Some(2), Some(10)];

        for after in cursors {
            for before in cursors {
                for first in limits {
                    for last in limits {
                        let a = args(after, before, first, last);
                        let page = paginate(&source, &"repo", &a).await.unwrap();
                        let got = keys(&page);

                        assert!(got.windows(2).all(|w| w[0] < w[1]), "{:?} for {:?}", got, a);
                        if after.is_none() && before.is_none() && last.is_none()
                            && let Some(n) = first
                        {
                            assert!(got.len() <= n as usize);
                        }
                        if after.is_none() && last.is_some() {
                            assert!(got.len() <= last.unwrap_or_default() as usize);
                        }
                        if let (Some(start), Some(end)) = (got.first(), got.last()) {
                            assert_eq!(page.has_previous_page, LETTERS.iter().any(|id| id < start));
                            assert_eq!(page.has_next_page, LETTERS.iter().any(|id| id > end));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_precedence() {
        let plan = FetchPlan::from_args(&args(None, Some("D"), Some(5), Some(2))).unwrap();
        assert_eq!(plan.range, KeyRange::below("D"));
        assert_eq!(plan.order, SortDirection::Desc);
        assert_eq!(plan.limit, Some(2));

        let plan = FetchPlan::from_args(&args(Some("B"), None, None, Some(2))).unwrap();
        assert_eq!(plan.order, SortDirection::Asc);
        assert_eq!(plan.limit, None);
    }

    #[test]
    fn test_assemble_uses_keys_as_cursors() {
        let page = Page {
            records: vec![Row("C".into()), Row("D".into())],
            has_previous_page: true,
            has_next_page: false,
        };
        let conn = Connection::assemble(page).map(|row| row.0.to_lowercase());

        assert_eq!(conn.nodes, vec!["c".to_string(), "d".to_string()]);
        assert_eq!(conn.edges[1].cursor, "D");
        assert_eq!(conn.total_count, 2);
        assert_eq!(conn.page_info.start_cursor.as_deref(), Some("C"));
        assert_eq!(conn.page_info.end_cursor.as_deref(), Some("D"));
        assert!(conn.page_info.has_previous_page);
    }
}
