//! SQLite message history implementation.
//!
//! Implements `HistoryStore` from `parley-core`. Messages are append-only
//! and deduplicated on `(session_id, role, content)`. Every write also
//! records the session's inferred title in the same transaction.

use chrono::{DateTime, Utc};
use parley_core::chat::repository::HistoryStore;
use parley_types::chat::{ChatMessage, MessageRole, SessionId};
use parley_types::error::StoreError;
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};
use tracing::debug;

use super::pool::DatabasePool;
use super::query_error;
use super::session::upsert_inferred_title;

/// SQLite-backed implementation of `HistoryStore`.
pub struct SqliteHistoryStore {
    pool: DatabasePool,
}

impl SqliteHistoryStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool.writer.begin().await.map_err(query_error)
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MessageRow {
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, StoreError> {
        let role: MessageRole = self.role.parse().map_err(StoreError::Query)?;
        Ok(ChatMessage {
            session_id: SessionId::from(self.session_id),
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| StoreError::Query(format!("invalid datetime '{s}': {e}")))
}

/// Insert one message unless the identical triple is already stored.
///
/// Returns whether a row was written.
async fn insert_message(
    conn: &mut SqliteConnection,
    session_id: &SessionId,
    role: MessageRole,
    content: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"INSERT INTO messages (session_id, role, content) VALUES (?, ?, ?)
           ON CONFLICT(session_id, role, content) DO NOTHING"#,
    )
    .bind(session_id.as_str())
    .bind(role.as_str())
    .bind(content)
    .execute(conn)
    .await
    .map_err(query_error)?;
    Ok(result.rows_affected() == 1)
}

/// Title the session from its first stored message if it has no title yet.
async fn ensure_title(conn: &mut SqliteConnection, session_id: &SessionId) -> Result<(), StoreError> {
    let first: Option<(String,)> =
        sqlx::query_as("SELECT content FROM messages WHERE session_id = ? ORDER BY id ASC LIMIT 1")
            .bind(session_id.as_str())
            .fetch_optional(&mut *conn)
            .await
            .map_err(query_error)?;

    match first {
        Some((content,)) => upsert_inferred_title(&mut *conn, session_id, &content).await,
        None => Ok(()),
    }
}

impl HistoryStore for SqliteHistoryStore {
    async fn append_turn(
        &self,
        session_id: &SessionId,
        role: MessageRole,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        let inserted = insert_message(&mut tx, session_id, role, content).await?;
        ensure_title(&mut tx, session_id).await?;
        tx.commit().await.map_err(query_error)?;

        if !inserted {
            debug!(session_id = %session_id, role = %role, "Duplicate message skipped");
        }
        Ok(())
    }

    async fn append_exchange(
        &self,
        session_id: &SessionId,
        user_text: &str,
        assistant_text: Option<&str>,
    ) -> Result<(), StoreError> {
        // Dropping `tx` on any early return rolls back both inserts.
        let mut tx = self.begin().await?;
        insert_message(&mut tx, session_id, MessageRole::User, user_text).await?;
        if let Some(text) = assistant_text {
            insert_message(&mut tx, session_id, MessageRole::Assistant, text).await?;
        }
        ensure_title(&mut tx, session_id).await?;
        tx.commit().await.map_err(query_error)?;

        debug!(
            session_id = %session_id,
            with_reply = assistant_text.is_some(),
            "Exchange persisted"
        );
        Ok(())
    }

    async fn get_history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT session_id, role, content, created_at FROM messages
               WHERE session_id = ?
               ORDER BY id ASC
               LIMIT ?"#,
        )
        .bind(session_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let messages = rows
            .iter()
            .map(|r| {
                MessageRow::from_row(r)
                    .map_err(query_error)
                    .and_then(MessageRow::into_message)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Backfill a title for rows written before titles were recorded.
        if let Some(first) = messages.first() {
            let title: Option<(Option<String>,)> =
                sqlx::query_as("SELECT session_title FROM sessions WHERE session_id = ?")
                    .bind(session_id.as_str())
                    .fetch_optional(&self.pool.reader)
                    .await
                    .map_err(query_error)?;
            if !matches!(title, Some((Some(_),))) {
                upsert_inferred_title(&self.pool.writer, session_id, &first.content).await?;
            }
        }

        Ok(messages)
    }
}
