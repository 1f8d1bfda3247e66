//! SQLite pool for the photo tag store.
//!
//! The tag table is tiny and written one record at a time, so a file-backed
//! store gets a small pool in WAL mode and an in-memory store gets exactly one
//! connection. Schema migrations run before the pool is handed out.
//!
//! ```rust,ignore
//! let pool = create_pool(DatabaseConfig::new("/data/gallery/tags.db")).await?;
//! let tags = SqlitePhotoTagRepository::new(pool);
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const FILE_POOL_SIZE: u32 = 4;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the tag database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    File(PathBuf),
    /// Private database that disappears with the pool.
    InMemory,
}

impl DatabaseConfig {
    /// A file-backed store. `":memory:"` selects [`DatabaseConfig::InMemory`].
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        if path == Path::new(":memory:") {
            Self::InMemory
        } else {
            Self::File(path)
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        match self {
            Self::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            Self::InMemory => SqliteConnectOptions::new().in_memory(true),
        }
        .foreign_keys(true)
    }

    /// Each connection to `:memory:` sees its own empty database, so the
    /// in-memory pool holds one connection for its whole life.
    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT);
        match self {
            Self::File(_) => options.max_connections(FILE_POOL_SIZE),
            Self::InMemory => options
                .min_connections(1)
                .max_connections(1)
                .max_lifetime(None)
                .idle_timeout(None),
        }
    }
}

/// Open the tag store and bring its schema up to date.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(database = ?config, "Opening tag database");

    let pool = config
        .pool_options()
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            warn!(error = %e, "Could not open tag database");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        warn!(error = %e, "Tag database migration failed");
        LibraryError::Migration(e.to_string())
    })?;

    debug!(connections = pool.size(), "Tag database ready");
    Ok(pool)
}

/// Migrated in-memory pool for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::InMemory).await
}
