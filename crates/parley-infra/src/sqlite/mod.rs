//! SQLite storage layer.
//!
//! Store implementations backed by SQLite in WAL mode with a split
//! read/write connection pool, all sharing one [`pool::DatabasePool`].

pub mod api_key;
pub mod history;
pub mod pool;
pub mod session;

use parley_types::error::StoreError;

/// Map a sqlx error to the store taxonomy.
pub(crate) fn query_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolClosed => StoreError::Closed,
        other => StoreError::Query(other.to_string()),
    }
}
