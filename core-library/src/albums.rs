//! # Album Directory
//!
//! User albums persisted in a key-value [`SettingsStore`]: one key per album
//! name, the value being the album's photo URIs joined with `,`.
//!
//! ## Storage format
//!
//! ```text
//! "Trip"    => "content://media/external/images/media/12,content://media/external/images/media/40"
//! "Empty"   => ""
//! ```
//!
//! Values are not escaped, so a URI containing a comma would split into two
//! entries when read back. Such URIs are rejected on insert. Legacy values are
//! read as-is; tokens that do not parse as URIs are skipped with a warning.
//!
//! Every mutation rewrites the whole store inside one settings transaction and
//! only then swaps the in-memory map, so a failed write leaves the directory
//! exactly as it was.
//!
//! "All Photos" is synthetic. It is always listed first and never stored.

use crate::error::{LibraryError, Result};
use crate::models::{Album, ALL_PHOTOS, LIST_SEPARATOR};
use bridge_traits::SettingsStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

type AlbumMap = BTreeMap<String, Vec<String>>;

pub struct AlbumDirectory {
    store: Arc<dyn SettingsStore>,
    albums: Mutex<AlbumMap>,
}

impl AlbumDirectory {
    /// Read every album from the store.
    #[instrument(skip(store))]
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self> {
        let mut albums = AlbumMap::new();

        for key in store.list_keys().await? {
            if key == ALL_PHOTOS {
                warn!("Ignoring stored value for the synthetic album");
                continue;
            }
            let value = store.get_string(&key).await?.unwrap_or_default();
            albums.insert(key, decode_uris(&value));
        }

        info!(albums = albums.len(), "Album directory loaded");
        Ok(Self {
            store,
            albums: Mutex::new(albums),
        })
    }

    /// Album names, "All Photos" first, then user albums by name.
    pub async fn list(&self) -> Vec<String> {
        let albums = self.albums.lock().await;
        std::iter::once(ALL_PHOTOS.to_string())
            .chain(albums.keys().cloned())
            .collect()
    }

    /// User albums with their contents.
    pub async fn albums(&self) -> Vec<Album> {
        self.albums
            .lock()
            .await
            .iter()
            .map(|(name, uris)| Album {
                name: name.clone(),
                photo_uris: uris.clone(),
            })
            .collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        name == ALL_PHOTOS || self.albums.lock().await.contains_key(name)
    }

    /// Create an empty album, returning the trimmed name.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<String> {
        let name = validate_name(name)?;

        let mut albums = self.albums.lock().await;
        if name == ALL_PHOTOS || albums.contains_key(&name) {
            return Err(already_exists(&name));
        }

        let mut next = albums.clone();
        next.insert(name.clone(), Vec::new());
        self.persist(&next).await?;
        *albums = next;

        info!(album = %name, "Album created");
        Ok(name)
    }

    /// Move an album's list under a new name, returning the trimmed name.
    #[instrument(skip(self))]
    pub async fn rename(&self, old: &str, new: &str) -> Result<String> {
        if old == ALL_PHOTOS {
            return Err(LibraryError::ReservedAlbum(ALL_PHOTOS.to_string()));
        }
        let new = validate_name(new)?;

        let mut albums = self.albums.lock().await;
        if new == ALL_PHOTOS || albums.contains_key(&new) {
            return Err(already_exists(&new));
        }

        let mut next = albums.clone();
        let uris = next.remove(old).ok_or_else(|| not_found(old))?;
        next.insert(new.clone(), uris);
        self.persist(&next).await?;
        *albums = next;

        info!(from = %old, to = %new, "Album renamed");
        Ok(new)
    }

    /// Append a photo to an album.
    #[instrument(skip(self, uri))]
    pub async fn add_photo(&self, album: &str, uri: &str) -> Result<()> {
        if album == ALL_PHOTOS {
            return Err(LibraryError::ReservedAlbum(ALL_PHOTOS.to_string()));
        }
        validate_uri(uri)?;

        let mut albums = self.albums.lock().await;
        let current = albums.get(album).ok_or_else(|| not_found(album))?;
        if current.iter().any(|existing| existing == uri) {
            return Err(LibraryError::AlreadyExists {
                entity_type: "Photo".to_string(),
                id: uri.to_string(),
            });
        }

        let mut next = albums.clone();
        if let Some(uris) = next.get_mut(album) {
            uris.push(uri.to_string());
        }
        self.persist(&next).await?;
        *albums = next;

        debug!(album = %album, uri = %uri, "Photo added to album");
        Ok(())
    }

    /// Photos of an album in insertion order; empty for unknown albums.
    ///
    /// "All Photos" also yields an empty list here. Its contents come from
    /// the gallery source.
    pub async fn photos_of(&self, album: &str) -> Vec<String> {
        self.albums
            .lock()
            .await
            .get(album)
            .cloned()
            .unwrap_or_default()
    }

    async fn persist(&self, albums: &AlbumMap) -> Result<()> {
        let mut tx = self.store.begin_transaction().await?;

        let written = async {
            tx.clear_all().await?;
            for (name, uris) in albums {
                tx.set_string(name, &uris.join(",")).await?;
            }
            Ok::<_, bridge_traits::BridgeError>(())
        }
        .await;

        match written {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to write albums, rolling back");
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(e.into())
            }
        }
    }
}

fn decode_uris(value: &str) -> Vec<String> {
    let mut uris: Vec<String> = Vec::new();
    for token in value.split(LIST_SEPARATOR).filter(|t| !t.is_empty()) {
        if Url::parse(token).is_err() {
            warn!(uri = %token, "Skipping malformed stored URI");
            continue;
        }
        if !uris.iter().any(|existing| existing == token) {
            uris.push(token.to_string());
        }
    }
    uris
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryError::InvalidInput {
            field: "name".to_string(),
            message: "Album name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

fn validate_uri(uri: &str) -> Result<()> {
    if uri.contains(LIST_SEPARATOR) {
        return Err(LibraryError::InvalidInput {
            field: "uri".to_string(),
            message: "Photo URI cannot contain ','".to_string(),
        });
    }
    Url::parse(uri).map_err(|e| LibraryError::InvalidInput {
        field: "uri".to_string(),
        message: format!("Invalid photo URI: {}", e),
    })?;
    Ok(())
}

fn already_exists(name: &str) -> LibraryError {
    LibraryError::AlreadyExists {
        entity_type: "Album".to_string(),
        id: name.to_string(),
    }
}

fn not_found(name: &str) -> LibraryError {
    LibraryError::NotFound {
        entity_type: "Album".to_string(),
        id: name.to_string(),
    }
}
