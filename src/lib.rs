//! repograph: a GraphQL API over users, repositories, issues, pull requests
//! and projects, backed by SQLite.
//!
//! Lists are keyset-paginated connections and reference fields are resolved
//! through request-scoped batch loaders; see [`graphql::pagination`] and
//! [`graphql::loaders`].

pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod server;
