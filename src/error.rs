//! Error types shared by the storage layer and the GraphQL resolvers.
//!
//! - [`StoreError`] - failures of the relational store (the upstream capability)
//! - [`ResolveError`] - what a resolver, the paginator or a loader reports
//!
//! `ResolveError` is `Clone` because a single failed batch fans out to every
//! caller waiting on it.

use std::sync::Arc;

use async_graphql::ErrorExtensions;
use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and row-mapping errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQL execution failed or the connection is gone.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back into a record.
    #[error("Invalid value in {table}.{column}: {message}")]
    Decode {
        table: &'static str,
        column: &'static str,
        message: String,
    },

    /// A unique or foreign key constraint rejected a write.
    #[error("Constraint violation: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Resolve Errors
// =============================================================================

/// Outcome of a failed lookup, page request or mutation.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No record with this key exists.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The caller broke the argument contract (e.g. `first: 0`).
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The store failed; the error is passed through untouched.
    #[error(transparent)]
    Upstream(Arc<StoreError>),

    /// The operation was cancelled or ran out of time.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ResolveError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Machine-readable code exposed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::Upstream(_) => "INTERNAL",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        Self::Upstream(Arc::new(err))
    }
}

impl From<Arc<StoreError>> for ResolveError {
    fn from(err: Arc<StoreError>) -> Self {
        Self::Upstream(err)
    }
}

impl ErrorExtensions for ResolveError {
    fn extend(&self) -> async_graphql::Error {
        if let Self::Upstream(err) = self {
            tracing::error!(error = %err, "Upstream store failure");
        }
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ResolveError::not_found("User", "U_1").code(), "NOT_FOUND");
        assert_eq!(ResolveError::Cancelled.code(), "CANCELLED");
        assert_eq!(
            ResolveError::InvalidArguments("first".into()).code(),
            "INVALID_ARGUMENTS"
        );
    }

    #[test]
    fn test_upstream_keeps_message() {
        let err: ResolveError = StoreError::Conflict("duplicate id".into()).into();
        assert_eq!(err.to_string(), "Constraint violation: duplicate id");
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn test_extensions_carry_code() {
        let err = ResolveError::not_found("Issue", "ISSUE_9").extend();
        assert_eq!(err.message, "Issue not found: ISSUE_9");
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("NOT_FOUND")));
    }
}
