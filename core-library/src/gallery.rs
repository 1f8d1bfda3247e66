//! # Gallery Source
//!
//! Materializes the synthetic "All Photos" album from the device media index.

use crate::error::Result;
use bridge_traits::{MediaIndex, PermissionStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Result of listing the device gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryListing {
    /// Photo URIs, newest first
    pub uris: Vec<String>,
    /// The user refused photo access; `uris` is empty
    pub permission_denied: bool,
}

impl GalleryListing {
    fn denied() -> Self {
        Self {
            uris: Vec::new(),
            permission_denied: true,
        }
    }
}

pub struct GallerySource {
    index: Arc<dyn MediaIndex>,
}

impl GallerySource {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    /// List every image on the device, newest first.
    ///
    /// Asks for permission once when it has not been decided yet. A refusal is
    /// not an error: the listing comes back empty and flagged.
    pub async fn all_photos(&self) -> Result<GalleryListing> {
        let mut status = self.index.permission_status().await?;
        if status == PermissionStatus::NotDetermined {
            debug!("Requesting photo permission");
            status = self.index.request_permission().await?;
        }

        if !status.is_granted() {
            warn!(?status, "Photo permission not granted");
            return Ok(GalleryListing::denied());
        }

        let mut entries = self.index.query_images().await?;
        // Stable sort keeps the index's order for equal timestamps
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        let uris: Vec<String> = entries
            .into_iter()
            .filter_map(|entry| match Url::parse(&entry.uri) {
                Ok(_) => Some(entry.uri),
                Err(e) => {
                    warn!(uri = %entry.uri, error = %e, "Skipping unparsable media URI");
                    None
                }
            })
            .collect();

        info!(photos = uris.len(), "Gallery listed");
        Ok(GalleryListing {
            uris,
            permission_denied: false,
        })
    }
}
