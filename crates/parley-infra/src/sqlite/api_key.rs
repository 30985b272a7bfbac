//! SQLite API key store.
//!
//! The key lives in a single-row table (`id = 1`) and is replaced in place.

use chrono::Utc;
use parley_core::chat::repository::ApiKeyStore;
use parley_types::error::StoreError;
use secrecy::{ExposeSecret, SecretString};

use super::pool::DatabasePool;
use super::query_error;

/// SQLite-backed implementation of `ApiKeyStore`.
pub struct SqliteApiKeyStore {
    pool: DatabasePool,
}

impl SqliteApiKeyStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl ApiKeyStore for SqliteApiKeyStore {
    async fn set_api_key(&self, key: &SecretString) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO api_keys (id, key, updated_at) VALUES (1, ?, ?)
               ON CONFLICT(id) DO UPDATE SET key = excluded.key, updated_at = excluded.updated_at"#,
        )
        .bind(key.expose_secret())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn get_api_key(&self) -> Result<Option<SecretString>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT key FROM api_keys WHERE id = 1")
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(row.map(|(key,)| SecretString::from(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> (DatabasePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::connect(&url).await.unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteApiKeyStore::new(pool);
        assert!(store.get_api_key().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_single_row() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteApiKeyStore::new(pool.clone());

        store.set_api_key(&SecretString::from("sk-first")).await.unwrap();
        store.set_api_key(&SecretString::from("sk-second")).await.unwrap();

        let key = store.get_api_key().await.unwrap().unwrap();
        assert_eq!(key.expose_secret(), "sk-second");

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM api_keys")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
