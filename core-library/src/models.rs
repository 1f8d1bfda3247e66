//! Domain models for the photo gallery
//!
//! Albums live in the key-value album directory; tags live in SQLite. Photos
//! themselves are only ever referred to by URI.

use crate::error::{LibraryError, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the synthetic album that mirrors the device gallery.
pub const ALL_PHOTOS: &str = "All Photos";

/// Separator used in both the album value format and the tag field.
pub const LIST_SEPARATOR: char = ',';

// =============================================================================
// Albums
// =============================================================================

/// A named, ordered, duplicate-free list of photo URIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    pub photo_uris: Vec<String>,
}

impl Album {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photo_uris: Vec::new(),
        }
    }

    pub fn is_all_photos(&self) -> bool {
        self.name == ALL_PHOTOS
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.photo_uris.iter().any(|existing| existing == uri)
    }

    /// Serialized value stored under the album's key.
    pub fn encode(&self) -> String {
        self.photo_uris.join(",")
    }
}

// =============================================================================
// Photo tags
// =============================================================================

/// Tag record for a single photo.
///
/// `tag` holds comma-joined tokens. Tokens are trimmed, never empty, and
/// unique ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PhotoTag {
    /// Storage-assigned key; 0 until inserted
    pub id: i64,
    pub uri: String,
    /// Kept for schema compatibility; album membership lives in the directory
    pub album_id: i64,
    pub tag: String,
}

impl PhotoTag {
    /// Unsaved record for a photo with no tags.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            id: 0,
            uri: uri.into(),
            album_id: 0,
            tag: String::new(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.uri.trim().is_empty() {
            return Err("Photo URI cannot be empty".to_string());
        }
        Ok(())
    }

    /// Tokens in stored order, trimmed, empties dropped.
    pub fn tags(&self) -> Vec<&str> {
        split_tokens(&self.tag).collect()
    }

    pub fn has_tags(&self) -> bool {
        split_tokens(&self.tag).next().is_some()
    }

    /// Append a tag, returning the trimmed token that was stored.
    ///
    /// # Errors
    /// - `EmptyTag` if the tag is blank
    /// - `AlreadyExists` if a token matches ignoring case; the field is unchanged
    pub fn add_tag(&mut self, tag: &str) -> Result<String> {
        let token = tag.trim();
        if token.is_empty() {
            return Err(LibraryError::EmptyTag);
        }

        let lowered = token.to_lowercase();
        if split_tokens(&self.tag).any(|existing| existing.to_lowercase() == lowered) {
            return Err(LibraryError::AlreadyExists {
                entity_type: "Tag".to_string(),
                id: token.to_string(),
            });
        }

        if self.tag.is_empty() {
            self.tag = token.to_string();
        } else {
            self.tag.push(LIST_SEPARATOR);
            self.tag.push_str(token);
        }
        Ok(token.to_string())
    }

    /// Remove every token exactly equal to `tag` (after trimming).
    ///
    /// Returns `false` and leaves the field untouched when nothing matched.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let target = tag.trim();
        if !split_tokens(&self.tag).any(|existing| existing == target) {
            return false;
        }

        self.tag = split_tokens(&self.tag)
            .filter(|existing| *existing != target)
            .collect::<Vec<_>>()
            .join(",");
        true
    }
}

fn split_tokens(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
