//! Settings Storage using SQLite

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingsStore, SettingsTransaction},
    time::{Clock, SystemClock},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

const UPSERT: &str = r#"
    INSERT INTO settings (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

fn storage_error(action: &str, e: sqlx::Error) -> BridgeError {
    BridgeError::Storage(format!("Failed to {}: {}", action, e))
}

/// SQLite-backed settings store implementation
///
/// Plays the role of a preferences file: one store per concern, string values
/// only, transactional bulk rewrites.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteSettingsStore {
    /// Open (or create) a settings database at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| storage_error("open settings database", e))?;

        Self::init(pool, &db_path.to_string_lossy()).await
    }

    /// Create an in-memory settings store (for testing)
    ///
    /// Every pooled connection to `:memory:` would see its own database, so
    /// the pool is pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| storage_error("open in-memory settings", e))?;

        Self::init(pool, ":memory:").await
    }

    async fn init(pool: SqlitePool, location: &str) -> Result<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| storage_error("create settings table", e))?;

        debug!(location = location, "Initialized settings store");

        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for `updated_at` stamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(self.clock.unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("set setting", e))?;

        debug!(key = key, "Stored setting");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("get setting", e))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete setting", e))?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("check key", e))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list keys", e))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("clear settings", e))?;

        debug!("Cleared all settings");
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        Ok(Box::new(SqliteSettingsTransaction {
            tx: Some(tx),
            now: self.clock.unix_timestamp(),
        }))
    }
}

/// SQLite settings transaction
struct SqliteSettingsTransaction {
    tx: Option<sqlx::Transaction<'static, sqlx::Sqlite>>,
    now: i64,
}

impl SqliteSettingsTransaction {
    fn open(&mut self) -> Result<&mut sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.tx.as_mut().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already finished".to_string())
        })
    }

    fn finish(&mut self) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.tx.take().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already finished".to_string())
        })
    }
}

#[async_trait]
impl SettingsTransaction for SqliteSettingsTransaction {
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        let now = self.now;
        let tx = self.open()?;

        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_error("set setting", e))?;

        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        let tx = self.open()?;

        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_error("delete setting", e))?;

        Ok(())
    }

    async fn clear_all(&mut self) -> Result<()> {
        let tx = self.open()?;

        sqlx::query("DELETE FROM settings")
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_error("clear settings", e))?;

        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish()?
            .commit()
            .await
            .map_err(|e| storage_error("commit", e))?;

        debug!("Committed settings transaction");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish()?
            .rollback()
            .await
            .map_err(|e| storage_error("rollback", e))?;

        debug!("Rolled back settings transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(self.0, 0).unwrap()
        }
    }

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("Trip", "content://a,content://b").await.unwrap();
        let value = store.get_string("Trip").await.unwrap();
        assert_eq!(value.as_deref(), Some("content://a,content://b"));
        assert!(store.has_key("Trip").await.unwrap());

        store.delete("Trip").await.unwrap();
        assert_eq!(store.get_string("Trip").await.unwrap(), None);
        assert!(!store.has_key("Trip").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_keys_sorted() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("Zoo", "").await.unwrap();
        store.set_string("Beach", "").await.unwrap();

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["Beach", "Zoo"]);
    }

    #[tokio::test]
    async fn test_transaction_rewrite_is_atomic() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_string("Old", "x").await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.clear_all().await.unwrap();
        tx.set_string("New", "x").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["New"]);
    }

    #[tokio::test]
    async fn test_transaction_rollback_keeps_previous_state() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_string("Keep", "x").await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.delete("Keep").await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.get_string("Keep").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_updated_at_uses_clock() {
        let store = SqliteSettingsStore::in_memory()
            .await
            .unwrap()
            .with_clock(Arc::new(FixedClock(1_700_000_000)));

        store.set_string("Trip", "").await.unwrap();

        let stamp: (i64,) = sqlx::query_as("SELECT updated_at FROM settings WHERE key = 'Trip'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(stamp.0, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = std::env::temp_dir().join(format!("bridge-desktop-{}", uuid::Uuid::new_v4()));
        let path = dir.join("albums.db");

        {
            let store = SqliteSettingsStore::new(path.clone()).await.unwrap();
            store.set_string("Trip", "content://a").await.unwrap();
        }

        let reopened = SqliteSettingsStore::new(path).await.unwrap();
        assert_eq!(
            reopened.get_string("Trip").await.unwrap().as_deref(),
            Some("content://a")
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
