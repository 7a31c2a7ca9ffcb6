//! Table metadata and query building shared by every record type.

pub mod builder;
pub mod traits;

pub use builder::{EntityQuery, execute_with_binds, insert_sql};
pub use traits::{
    ColumnDef, DatabaseEntity, DatabaseSchema, FromSqlRow, SortDirection, SqlValue, ToSqlRow,
};
