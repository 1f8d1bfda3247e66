//! Key-Value Preference Storage
//!
//! Flat string preferences used by the album directory. Each album is one key
//! whose value is the album's comma-joined URI list.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - iOS: UserDefaults suite
/// - Android: SharedPreferences file
/// - Desktop: SQLite-backed key-value table
///
/// One store instance is expected to be dedicated to a single concern. The
/// album directory, for example, treats every key in its store as an album
/// name and rewrites the store wholesale on each mutation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_album(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("Trip", "content://media/1,content://media/2").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys, ordered by key
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Begin a transaction for atomic updates
    ///
    /// Nothing written through the transaction is visible until
    /// [`SettingsTransaction::commit`] succeeds. Dropping the transaction
    /// without committing discards its writes.
    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>>;
}

/// Transaction for atomic settings updates
#[async_trait]
pub trait SettingsTransaction: Send {
    /// Set a value within the transaction
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key within the transaction
    async fn delete(&mut self, key: &str) -> Result<()>;

    /// Remove every key within the transaction
    async fn clear_all(&mut self) -> Result<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
