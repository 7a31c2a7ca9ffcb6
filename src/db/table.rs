//! Generic table access
//!
//! `Table<E>` is the single storage implementation behind every entity: key
//! lookups, inserts, and the two capabilities the GraphQL core consumes
//! ([`KeysetSource`] for connections and [`BatchFetch`] for loaders).

use std::marker::PhantomData;

use async_trait::async_trait;

use super::Database;
use super::orm::{
    DatabaseSchema, EntityQuery, FromSqlRow, SortDirection, ToSqlRow, execute_with_binds,
    insert_sql,
};
use crate::error::StoreResult;
use crate::graphql::loaders::BatchFetch;
use crate::graphql::pagination::{KeyRange, Keyed, KeysetSource};

/// Bound for the record types stored in a [`Table`].
pub trait Record:
    DatabaseSchema + FromSqlRow + ToSqlRow + Keyed + Clone + Send + Sync + 'static
{
}

impl<T> Record for T where
    T: DatabaseSchema + FromSqlRow + ToSqlRow + Keyed + Clone + Send + Sync + 'static
{
}

/// Restricts a keyset scan to the rows of one parent (`column = value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    pub column: &'static str,
    pub value: String,
}

impl ScopeFilter {
    pub fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Typed handle on one entity table.
pub struct Table<E> {
    db: Database,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Record> Table<E> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Start a query on this table.
    pub fn query(&self) -> EntityQuery<E> {
        EntityQuery::new().log_statements(self.db.sql_debug())
    }

    /// Look up one record by primary key.
    pub async fn get(&self, id: &str) -> StoreResult<Option<E>> {
        self.query()
            .where_clause(&format!("{} = ?", E::PRIMARY_KEY), id)
            .fetch_optional(self.db.pool())
            .await
    }

    pub async fn insert(&self, record: &E) -> StoreResult<()> {
        let sql = insert_sql::<E>(false);
        execute_with_binds(&sql, &record.to_sql_values(), self.db.pool()).await?;
        tracing::debug!(entity = E::ENTITY_NAME, id = record.key(), "Inserted record");
        Ok(())
    }

    /// Insert unless a row with the same key or unique columns exists.
    /// Returns whether a row was written.
    pub async fn insert_or_ignore(&self, record: &E) -> StoreResult<bool> {
        let sql = insert_sql::<E>(true);
        let result = execute_with_binds(&sql, &record.to_sql_values(), self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    fn scoped(&self, scope: &ScopeFilter, range: &KeyRange) -> EntityQuery<E> {
        let mut query = self
            .query()
            .where_clause(&format!("{} = ?", scope.column), scope.value.as_str());
        if let Some(after) = &range.after {
            query = query.where_clause(&format!("{} > ?", E::PRIMARY_KEY), after.as_str());
        }
        if let Some(before) = &range.before {
            query = query.where_clause(&format!("{} < ?", E::PRIMARY_KEY), before.as_str());
        }
        query
    }
}

#[async_trait]
impl<E: Record> KeysetSource for Table<E> {
    type Node = E;
    type Scope = ScopeFilter;

    async fn fetch(
        &self,
        scope: &ScopeFilter,
        range: &KeyRange,
        order: SortDirection,
        limit: Option<u64>,
    ) -> StoreResult<Vec<E>> {
        let mut query = self.scoped(scope, range).order_by(E::PRIMARY_KEY, order);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query.fetch_all(self.db.pool()).await
    }

    async fn exists(&self, scope: &ScopeFilter, range: &KeyRange) -> StoreResult<bool> {
        self.scoped(scope, range).exists(self.db.pool()).await
    }
}

#[async_trait]
impl<E: Record> BatchFetch for Table<E> {
    type Record = E;

    fn entity(&self) -> &'static str {
        E::ENTITY_NAME
    }

    async fn fetch_by_keys(&self, keys: &[String]) -> StoreResult<Vec<E>> {
        self.query()
            .where_in(E::PRIMARY_KEY, keys.iter().cloned())
            .fetch_all(self.db.pool())
            .await
    }
}
