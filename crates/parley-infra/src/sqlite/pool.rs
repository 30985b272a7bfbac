//! Database pool with split reader/writer connections in WAL mode, and the
//! one-shot [`Store`] that opens it.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! multi-connection reader pool for concurrent reads with a
//! single-connection writer pool for serialized writes, so transactions
//! (session naming, exchange inserts) never contend with each other.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use parley_types::error::StoreError;

/// Writer connections (SQLite serializes writes anyway).
const WRITER_CONNECTIONS: u32 = 1;
/// Reader connections; together with the writer, 25 open at most.
const READER_CONNECTIONS: u32 = 24;
/// Reader connections kept warm.
const MIN_READER_CONNECTIONS: u32 = 5;
/// Idle connections above the minimum are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Connections are recycled after this lifetime.
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 24) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE.
#[derive(Clone, Debug)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools, run migrations on the writer and verify connectivity.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let base_opts = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Open(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(WRITER_CONNECTIONS)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .max_lifetime(Some(MAX_LIFETIME))
            .connect_with(write_opts)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        // Run migrations on writer before opening reader pool
        sqlx::migrate!("../../migrations")
            .run(&writer)
            .await
            .map_err(|e| StoreError::Migrate(e.to_string()))?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .min_connections(MIN_READER_CONNECTIONS)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .max_lifetime(Some(MAX_LIFETIME))
            .connect_with(read_opts)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&reader)
            .await
            .map_err(|e| StoreError::Open(format!("connectivity check failed: {e}")))?;

        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

/// The process's single storage handle.
///
/// Construct one at startup and share it. [`Store::initialize`] opens and
/// migrates the database exactly once: the first caller does the work and
/// every caller, concurrent or later, observes that same outcome. A failed
/// initialization is not retried; build a new `Store` to try again.
pub struct Store {
    database_url: String,
    pool: OnceCell<Result<DatabasePool, StoreError>>,
    init_runs: AtomicUsize,
}

impl Store {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
            init_runs: AtomicUsize::new(0),
        }
    }

    /// Open the database and create the schema if absent (idempotent).
    pub async fn initialize(&self) -> Result<DatabasePool, StoreError> {
        self.pool
            .get_or_init(|| async {
                self.init_runs.fetch_add(1, Ordering::SeqCst);
                debug!(url = %self.database_url, "Opening database");
                let result = DatabasePool::connect(&self.database_url).await;
                match &result {
                    Ok(_) => info!("Database ready"),
                    Err(e) => warn!(error = %e, "Database initialization failed"),
                }
                result
            })
            .await
            .clone()
    }

    /// The pool, if initialization has completed successfully.
    pub fn handle(&self) -> Option<DatabasePool> {
        match self.pool.get() {
            Some(Ok(pool)) => Some(pool.clone()),
            _ => None,
        }
    }

    /// How many times open-and-migrate has actually run (0 or 1).
    pub fn init_runs(&self) -> usize {
        self.init_runs.load(Ordering::SeqCst)
    }

    /// Release the pools. A no-op when never (successfully) initialized.
    ///
    /// Afterwards every store operation fails with [`StoreError::Closed`].
    pub async fn close(&self) -> Result<(), StoreError> {
        if let Some(Ok(pool)) = self.pool.get() {
            pool.close().await;
            debug!("Database closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    fn temp_url(dir: &tempfile::TempDir, name: &str) -> String {
        format!("sqlite://{}?mode=rwc", dir.path().join(name).display())
    }

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::connect(&temp_url(&dir, "test.db")).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, vec!["api_keys", "messages", "sessions"]);
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::connect(&temp_url(&dir, "test_wal.db")).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_reopen_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = temp_url(&dir, "reopen.db");

        let first = DatabasePool::connect(&url).await.unwrap();
        sqlx::query("INSERT INTO sessions (session_id) VALUES ('Session0')")
            .execute(&first.writer)
            .await
            .unwrap();
        first.close().await;

        let second = DatabasePool::connect(&url).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&second.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(temp_url(&dir, "once.db")));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.initialize().await.is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(store.init_runs(), 1);
        assert!(store.handle().is_some());

        // Repeated calls reuse the same outcome without reopening.
        store.initialize().await.unwrap();
        assert_eq!(store.init_runs(), 1);
    }

    #[tokio::test]
    async fn test_failed_initialize_is_shared_and_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("missing").join("nested").join("x.db").display()
        );
        let store = Arc::new(Store::new(url));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.initialize().await }));
        }
        let mut errors = Vec::new();
        for handle in handles {
            errors.push(handle.await.unwrap().unwrap_err());
        }

        assert!(matches!(errors[0], StoreError::Open(_)));
        assert!(errors.iter().all(|e| e == &errors[0]));
        assert_eq!(store.init_runs(), 1);
        assert!(store.handle().is_none());

        let again = store.initialize().await.unwrap_err();
        assert_eq!(again, errors[0]);
        assert_eq!(store.init_runs(), 1);
    }

    #[tokio::test]
    async fn test_close_without_initialize_is_noop() {
        let store = Store::new("sqlite://never-opened.db");
        store.close().await.unwrap();
        assert_eq!(store.init_runs(), 0);
    }

    #[tokio::test]
    async fn test_operations_after_close_report_closed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_url(&dir, "closed.db"));
        let pool = store.initialize().await.unwrap();

        store.close().await.unwrap();

        let err = sqlx::query("SELECT 1")
            .execute(&pool.reader)
            .await
            .map_err(crate::sqlite::query_error)
            .unwrap_err();
        assert_eq!(err, StoreError::Closed);
    }
}
