//! Filesystem-backed media index
//!
//! Treats a pictures directory as the device gallery. Every image file below
//! the root is reported with a `file://` URI and its creation (or, failing
//! that, modification) time as the "added" timestamp.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{MediaEntry, MediaIndex, PermissionStatus},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "heic"];

/// Desktop media index scanning a directory tree.
///
/// Desktop has no OS photo permission; "granting" access means the root is
/// readable. The first [`request_permission`](MediaIndex::request_permission)
/// probes the directory and remembers the outcome.
pub struct FsMediaIndex {
    root: PathBuf,
    permission: RwLock<PermissionStatus>,
}

impl FsMediaIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            permission: RwLock::new(PermissionStatus::NotDetermined),
        }
    }

    /// Index over the user's pictures directory, if the platform defines one.
    pub fn user_pictures() -> Option<Self> {
        dirs::picture_dir().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Override the remembered permission (e.g. after the user revokes access
    /// in host settings).
    pub async fn set_permission(&self, status: PermissionStatus) {
        *self.permission.write().await = status;
    }

    fn scan(root: &Path) -> Vec<MediaEntry> {
        WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
            .filter_map(|entry| {
                let uri = match Url::from_file_path(entry.path()) {
                    Ok(url) => url.to_string(),
                    Err(()) => {
                        warn!("Skipping image with non-absolute path");
                        return None;
                    }
                };
                Some(MediaEntry::new(uri, added_at(entry.path())))
            })
            .collect()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn added_at(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or_else(|_| SystemTime::now())
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl MediaIndex for FsMediaIndex {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        Ok(*self.permission.read().await)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let mut permission = self.permission.write().await;
        if *permission != PermissionStatus::NotDetermined {
            return Ok(*permission);
        }

        *permission = match tokio::fs::read_dir(&self.root).await {
            Ok(_) => PermissionStatus::Granted,
            Err(e) => {
                warn!(error = %e, "Pictures directory is not readable");
                PermissionStatus::Denied
            }
        };
        Ok(*permission)
    }

    async fn query_images(&self) -> Result<Vec<MediaEntry>> {
        if !self.permission.read().await.is_granted() {
            return Err(BridgeError::PermissionDenied(
                "Access to the pictures directory was not granted".to_string(),
            ));
        }

        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || Self::scan(&root))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Media scan aborted: {}", e)))?;

        info!(count = entries.len(), "Scanned pictures directory");
        Ok(entries)
    }
}
