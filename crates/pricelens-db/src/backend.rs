use pricelens_core::AppError;
use pricelens_core::traits::KvBackend;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::StorageConfig;

/// Key-value storage backed by a local SQLite file.
///
/// Values are whole JSON documents serialized by the stores; this layer
/// never inspects them. The pool is cheap to clone and shared across
/// stores.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if necessary) the storage file and ensure the
    /// schema exists.
    pub async fn connect(config: &StorageConfig) -> Result<Self, AppError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::StorageError(format!("Failed to create {parent:?}: {e}")))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to open storage: {e}")))?;

        let backend = Self { pool };
        backend.init().await?;
        tracing::debug!(path = %config.path.display(), "Storage ready");
        Ok(backend)
    }

    /// Create a backend from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, AppError> {
        let backend = Self { pool };
        backend.init().await?;
        Ok(backend)
    }

    async fn init(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageError(format!("Schema init failed: {e}")))?;
        Ok(())
    }
}

impl KvBackend for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(())
    }
}
