//! SQLite session directory implementation.
//!
//! Implements `SessionDirectory` from `parley-core`. Writes go through the
//! single-connection writer pool; lookups use the reader pool.

use parley_core::chat::repository::SessionDirectory;
use parley_core::chat::title::infer_title;
use parley_types::chat::SessionId;
use parley_types::error::StoreError;
use sqlx::{Row, Sqlite};
use tracing::debug;

use super::pool::DatabasePool;
use super::query_error;

/// SQLite-backed implementation of `SessionDirectory`.
pub struct SqliteSessionDirectory {
    pool: DatabasePool,
}

impl SqliteSessionDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Insert the session row with a title inferred from `first_content`, or
/// fill in the title of an existing untitled row. A recorded title wins.
///
/// Shared with the history store so inference can run inside its
/// exchange transaction.
pub(crate) async fn upsert_inferred_title<'e, E>(
    executor: E,
    session_id: &SessionId,
    first_content: &str,
) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let title = infer_title(first_content);
    sqlx::query(
        r#"INSERT INTO sessions (session_id, session_title) VALUES (?, ?)
           ON CONFLICT(session_id) DO UPDATE SET session_title = excluded.session_title
           WHERE sessions.session_title IS NULL"#,
    )
    .bind(session_id.as_str())
    .bind(&title)
    .execute(executor)
    .await
    .map_err(query_error)?;
    Ok(())
}

impl SessionDirectory for SqliteSessionDirectory {
    async fn create_session(&self) -> Result<SessionId, StoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;

        // Sessions created implicitly by a first message can occupy a
        // `Session<N>` name out of sequence; step past them.
        let mut n = count.max(0) as u64;
        let id = loop {
            let candidate = SessionId::sequential(n);
            let inserted = sqlx::query(
                "INSERT INTO sessions (session_id) VALUES (?) ON CONFLICT(session_id) DO NOTHING",
            )
            .bind(candidate.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

            if inserted.rows_affected() == 1 {
                break candidate;
            }
            n += 1;
        };

        tx.commit().await.map_err(query_error)?;
        debug!(session_id = %id, "Reserved session");
        Ok(id)
    }

    async fn get_title(&self, session_id: &SessionId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT session_title FROM sessions WHERE session_id = ?")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(r) => r.try_get("session_title").map_err(query_error),
            None => Ok(None),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        let rows = sqlx::query("SELECT session_id FROM sessions ORDER BY id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("session_id")
                    .map(SessionId::from)
                    .map_err(query_error)
            })
            .collect()
    }

    async fn infer_title_if_absent(
        &self,
        session_id: &SessionId,
        first_content: &str,
    ) -> Result<(), StoreError> {
        upsert_inferred_title(&self.pool.writer, session_id, first_content).await
    }
}
