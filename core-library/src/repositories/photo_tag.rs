//! Photo tag repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::PhotoTag;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

/// Photo tag repository interface for data access operations
#[async_trait]
pub trait PhotoTagRepository: Send + Sync {
    /// Insert a new record and return it with its assigned id
    ///
    /// # Errors
    /// Returns error if the URI is blank or a database error occurs
    async fn insert(&self, uri: &str, album_id: i64, tag: &str) -> Result<PhotoTag>;

    /// Find the record for a photo
    ///
    /// URIs are not unique in storage; the oldest record wins.
    async fn find_by_uri(&self, uri: &str) -> Result<Option<PhotoTag>>;

    /// Records carrying the given album id
    async fn find_in_album(&self, album_id: i64) -> Result<Vec<PhotoTag>>;

    /// Records whose tag field contains `keyword`
    ///
    /// This is a case-sensitive substring match over the whole joined field,
    /// so "cat" also finds "cats,dogs".
    async fn search_by_tag(&self, keyword: &str) -> Result<Vec<PhotoTag>>;

    /// Overwrite every column of an existing record
    ///
    /// # Errors
    /// Returns `NotFound` if no record has `record.id`
    async fn update(&self, record: &PhotoTag) -> Result<()>;

    async fn find_all(&self) -> Result<Vec<PhotoTag>>;
}

/// SQLite implementation of PhotoTagRepository
pub struct SqlitePhotoTagRepository {
    pool: SqlitePool,
}

impl SqlitePhotoTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(record: &PhotoTag) -> Result<()> {
        record.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "uri".to_string(),
            message: msg,
        })
    }
}

#[async_trait]
impl PhotoTagRepository for SqlitePhotoTagRepository {
    async fn insert(&self, uri: &str, album_id: i64, tag: &str) -> Result<PhotoTag> {
        let mut record = PhotoTag {
            id: 0,
            uri: uri.to_string(),
            album_id,
            tag: tag.to_string(),
        };
        Self::validate(&record)?;

        let result = sqlx::query("INSERT INTO photos (uri, album_id, tag) VALUES (?, ?, ?)")
            .bind(&record.uri)
            .bind(record.album_id)
            .bind(&record.tag)
            .execute(&self.pool)
            .await?;

        record.id = result.last_insert_rowid();
        debug!(id = record.id, "Inserted photo tag record");
        Ok(record)
    }

    async fn find_by_uri(&self, uri: &str) -> Result<Option<PhotoTag>> {
        let record = sqlx::query_as::<_, PhotoTag>(
            "SELECT id, uri, album_id, tag FROM photos WHERE uri = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(uri)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_in_album(&self, album_id: i64) -> Result<Vec<PhotoTag>> {
        let records = sqlx::query_as::<_, PhotoTag>(
            "SELECT id, uri, album_id, tag FROM photos WHERE album_id = ? ORDER BY id ASC",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn search_by_tag(&self, keyword: &str) -> Result<Vec<PhotoTag>> {
        // instr() is case-sensitive, unlike LIKE
        let records = sqlx::query_as::<_, PhotoTag>(
            "SELECT id, uri, album_id, tag FROM photos WHERE instr(tag, ?) > 0 ORDER BY id ASC",
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn update(&self, record: &PhotoTag) -> Result<()> {
        Self::validate(record)?;

        let result = sqlx::query("UPDATE photos SET uri = ?, album_id = ?, tag = ? WHERE id = ?")
            .bind(&record.uri)
            .bind(record.album_id)
            .bind(&record.tag)
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "PhotoTag".to_string(),
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<PhotoTag>> {
        let records =
            sqlx::query_as::<_, PhotoTag>("SELECT id, uri, album_id, tag FROM photos ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(records)
    }
}
