//! GraphQL API
//!
//! - `pagination` - keyset cursor engine and connection types
//! - `loaders` - request-scoped batching of single-key lookups
//! - `complexity` - cost estimate used for admission control
//! - `operation` - per-request scope holding loaders and cancellation
//! - `types`, `schema` - the object graph and its roots

pub mod auth;
pub mod complexity;
pub mod loaders;
pub mod operation;
pub mod pagination;
pub mod schema;
pub mod types;

pub use auth::{AuthGuard, AuthUser};
pub use operation::Operation;
pub use schema::{RepographSchema, build_schema};
