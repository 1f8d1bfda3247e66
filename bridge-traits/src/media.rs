//! Device Media Index
//!
//! Read-only access to the platform's photo index (MediaStore, Photos
//! framework, a pictures directory on desktop).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Whether the host has been granted access to the user's photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// One image known to the media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Stable content identifier (`content://...`, `file://...`, `ph://...`)
    pub uri: String,
    /// Unix timestamp (seconds) the image was added to the index
    pub added_at: i64,
}

impl MediaEntry {
    pub fn new(uri: impl Into<String>, added_at: i64) -> Self {
        Self {
            uri: uri.into(),
            added_at,
        }
    }
}

/// Media index trait
///
/// Implementations are expected to be cheap to query repeatedly; the core does
/// not cache results between gallery reloads.
///
/// # Platform Support
///
/// - **Android**: `MediaStore.Images` filtered by granted scope
/// - **iOS**: `PHAsset` fetch
/// - **Desktop**: recursive scan of a pictures directory
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::{MediaIndex, PermissionStatus};
///
/// async fn newest(index: &dyn MediaIndex) -> Result<Option<String>> {
///     if index.permission_status().await? != PermissionStatus::Granted {
///         return Ok(None);
///     }
///     let mut entries = index.query_images().await?;
///     entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
///     Ok(entries.into_iter().next().map(|e| e.uri))
/// }
/// ```
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Current permission state without prompting the user
    async fn permission_status(&self) -> Result<PermissionStatus>;

    /// Ask the user for access (no-op when already decided)
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// All images visible under the granted scope, in no particular order
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PermissionDenied`](crate::error::BridgeError::PermissionDenied)
    /// when called without a grant.
    async fn query_images(&self) -> Result<Vec<MediaEntry>>;
}
