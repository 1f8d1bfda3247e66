//! # Collection View Controller
//!
//! Drives the main photo grid. The controller owns which photos are on
//! screen (the device gallery, a user album or tag search results), how they
//! are laid out, and the album menu commands that change them.
//!
//! Hosts render [`CollectionSnapshot`]s from [`CollectionController::subscribe`]
//! and call the async commands. Failures are returned to the caller and also
//! posted as a [`Notice`] on the event bus; the view is left unchanged.
//!
//! ## Tag prefetch
//!
//! Each time the photo list changes, a background task loads the tag record
//! of every visible photo. Its result is merged only if the controller is
//! still alive and the list has not changed since (same generation).

use crate::error::{CoreError, Result};
use core_library::{AlbumDirectory, GallerySource, LibraryError, PhotoTagRepository, ALL_PHOTOS};
use core_runtime::events::{AlbumEvent, CollectionEvent, CoreEvent, EventBus, Notice};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};
use url::Url;

// ============================================================================
// View model
// ============================================================================

/// Which photos are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSource {
    /// The synthetic "All Photos" album
    Gallery,
    Album(String),
    /// Tag search on top of the gallery or an album
    SearchResults {
        query: String,
        previous: Box<ViewSource>,
    },
}

impl ViewSource {
    fn for_album(name: &str) -> Self {
        if name == ALL_PHOTOS {
            ViewSource::Gallery
        } else {
            ViewSource::Album(name.to_string())
        }
    }

    pub fn label(&self) -> String {
        match self {
            ViewSource::Gallery => ALL_PHOTOS.to_string(),
            ViewSource::Album(name) => name.clone(),
            ViewSource::SearchResults { query, .. } => format!("Search: {}", query),
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, ViewSource::SearchResults { .. })
    }

    /// The gallery or album underneath an active search.
    pub fn base(&self) -> &ViewSource {
        match self {
            ViewSource::SearchResults { previous, .. } => previous.base(),
            other => other,
        }
    }

    /// User album the album menu acts on, if any.
    pub fn current_album(&self) -> Option<&str> {
        match self.base() {
            ViewSource::Album(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Grid => "Grid View",
            ViewMode::List => "List View",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    pub uri: String,
    /// First tag plus a `(+N)` overflow count
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub uri: String,
    pub file_name: String,
    pub tags_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    Grid(GridItem),
    List(ListItem),
}

impl DisplayItem {
    pub fn uri(&self) -> &str {
        match self {
            DisplayItem::Grid(item) => &item.uri,
            DisplayItem::List(item) => &item.uri,
        }
    }
}

/// Everything a host needs to draw the collection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSnapshot {
    /// Bumped whenever the photo list is reloaded
    pub generation: u64,
    pub source: ViewSource,
    pub mode: ViewMode,
    pub uris: Vec<String>,
    pub items: Vec<DisplayItem>,
    /// Result summary while searching
    pub header: Option<String>,
}

fn grid_caption(tags: &str) -> Option<String> {
    let tokens: Vec<&str> = tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    match tokens.as_slice() {
        [] => None,
        [only] => Some(only.to_string()),
        [first, rest @ ..] => Some(format!("{} (+{})", first, rest.len())),
    }
}

fn file_name(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Image".to_string())
}

fn search_header(query: &str, hits: usize) -> String {
    if hits == 0 {
        format!("No results for: \"{}\"", query)
    } else {
        format!("{} results for: \"{}\"", hits, query)
    }
}

struct ViewState {
    generation: u64,
    source: ViewSource,
    mode: ViewMode,
    uris: Vec<String>,
    /// Raw tag field per URI, filled by prefetch
    tags: HashMap<String, String>,
}

impl ViewState {
    fn new() -> Self {
        Self {
            generation: 0,
            source: ViewSource::Gallery,
            mode: ViewMode::default(),
            uris: Vec::new(),
            tags: HashMap::new(),
        }
    }

    fn snapshot(&self) -> CollectionSnapshot {
        let items = self
            .uris
            .iter()
            .map(|uri| {
                let tags = self.tags.get(uri).map(String::as_str).unwrap_or("");
                match self.mode {
                    ViewMode::Grid => DisplayItem::Grid(GridItem {
                        uri: uri.clone(),
                        caption: grid_caption(tags),
                    }),
                    ViewMode::List => DisplayItem::List(ListItem {
                        uri: uri.clone(),
                        file_name: file_name(uri),
                        tags_label: if tags.is_empty() {
                            "No tags".to_string()
                        } else {
                            format!("Tags: {}", tags)
                        },
                    }),
                }
            })
            .collect();

        let header = match &self.source {
            ViewSource::SearchResults { query, .. } => Some(search_header(query, self.uris.len())),
            _ => None,
        };

        CollectionSnapshot {
            generation: self.generation,
            source: self.source.clone(),
            mode: self.mode,
            uris: self.uris.clone(),
            items,
            header,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

struct Inner {
    albums: Arc<AlbumDirectory>,
    gallery: Arc<GallerySource>,
    tags: Arc<dyn PhotoTagRepository>,
    events: EventBus,
    prefetch_tags: bool,
    state: Mutex<ViewState>,
    snapshot: watch::Sender<CollectionSnapshot>,
}

impl Inner {
    fn publish(&self, state: &ViewState) {
        self.snapshot.send_replace(state.snapshot());
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine
        let _ = self.events.emit(event);
    }
}

pub struct CollectionController {
    inner: Arc<Inner>,
}

impl CollectionController {
    /// Create a controller showing an empty gallery. Call
    /// [`refresh`](Self::refresh) to load it.
    pub fn new(
        albums: Arc<AlbumDirectory>,
        gallery: Arc<GallerySource>,
        tags: Arc<dyn PhotoTagRepository>,
        events: EventBus,
        prefetch_tags: bool,
    ) -> Self {
        let state = ViewState::new();
        let (snapshot, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                albums,
                gallery,
                tags,
                events,
                prefetch_tags,
                state: Mutex::new(state),
                snapshot,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Album names for the picker, "All Photos" first.
    pub async fn album_names(&self) -> Vec<String> {
        self.inner.albums.list().await
    }

    pub async fn current_album(&self) -> Option<String> {
        let state = self.inner.state.lock().await;
        state.source.current_album().map(str::to_string)
    }

    /// Reload whatever is currently shown.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let source = state.source.clone();
        let result = self.show(&mut state, source).await;
        self.report(result)
    }

    /// Show an album; "All Photos" shows the device gallery. Any active
    /// search is dropped.
    #[instrument(skip(self))]
    pub async fn select_album(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let result = self.show(&mut state, ViewSource::for_album(name)).await;
        self.report(result)
    }

    /// Show photos whose tags contain `query`. Returns the number of hits.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<usize> {
        let query = query.trim();
        if query.is_empty() {
            return self.report(Err(CoreError::EmptySearch));
        }

        let mut state = self.inner.state.lock().await;
        let source = ViewSource::SearchResults {
            query: query.to_string(),
            previous: Box::new(state.source.base().clone()),
        };

        match self.show(&mut state, source).await {
            Ok(()) => {
                let hits = state.uris.len();
                info!(hits, "Tag search completed");
                self.inner
                    .emit(CoreEvent::Collection(CollectionEvent::SearchCompleted {
                        query: query.to_string(),
                        result_count: hits,
                    }));
                Ok(hits)
            }
            Err(e) => {
                if state.source.is_search() {
                    let base = state.source.base().clone();
                    if let Err(reload) = self.show(&mut state, base).await {
                        warn!(error = %reload, "Could not reload view after failed search");
                    }
                }
                self.report(Err(e))
            }
        }
    }

    /// Leave search results. Returns false when no search was active.
    pub async fn cancel_search(&self) -> Result<bool> {
        let mut state = self.inner.state.lock().await;
        if !state.source.is_search() {
            return Ok(false);
        }
        let base = state.source.base().clone();
        let result = self.show(&mut state, base).await;
        self.report(result).map(|()| true)
    }

    /// Back press: cancels an active search. Returns whether it was consumed.
    pub async fn handle_back(&self) -> Result<bool> {
        self.cancel_search().await
    }

    pub async fn toggle_view_mode(&self) -> ViewMode {
        let mut state = self.inner.state.lock().await;
        state.mode = state.mode.toggled();
        self.inner.publish(&state);
        self.inner
            .emit(CoreEvent::Collection(CollectionEvent::ViewModeChanged {
                mode: state.mode.label().to_string(),
            }));
        state.mode
    }

    pub async fn create_album(&self, name: &str) -> Result<String> {
        let result = self.inner.albums.create(name).await.map_err(CoreError::from);
        let name = self.report(result)?;

        self.inner
            .events
            .notify(Notice::info(format!("Album created: {}", name)));
        self.inner.emit(CoreEvent::Album(AlbumEvent::Created { name: name.clone() }));
        Ok(name)
    }

    /// Rename the album being viewed (or searched within).
    pub async fn rename_current_album(&self, new_name: &str) -> Result<String> {
        let mut state = self.inner.state.lock().await;
        let Some(old) = state.source.current_album().map(str::to_string) else {
            return self.report(Err(LibraryError::ReservedAlbum(ALL_PHOTOS.to_string()).into()));
        };

        let result = self
            .inner
            .albums
            .rename(&old, new_name)
            .await
            .map_err(CoreError::from);
        let renamed = self.report(result)?;

        if state.source.is_search() {
            // Results stay; only the album underneath changes name
            if let ViewSource::SearchResults { previous, .. } = &mut state.source {
                **previous = ViewSource::Album(renamed.clone());
            }
            self.inner.publish(&state);
        } else {
            let result = self
                .show(&mut state, ViewSource::Album(renamed.clone()))
                .await;
            self.report(result)?;
        }

        self.inner
            .events
            .notify(Notice::info(format!("Album renamed to: {}", renamed)));
        self.inner.emit(CoreEvent::Album(AlbumEvent::Renamed {
            from: old,
            to: renamed.clone(),
        }));
        Ok(renamed)
    }

    /// Add a picked photo to the album being viewed.
    pub async fn add_photo_to_current(&self, uri: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let Some(album) = state.source.current_album().map(str::to_string) else {
            return self.report(Err(CoreError::NoCurrentAlbum));
        };

        let result = self
            .inner
            .albums
            .add_photo(&album, uri)
            .await
            .map_err(CoreError::from);
        self.report(result)?;

        self.inner
            .events
            .notify(Notice::info(format!("Photo added to {}", album)));
        self.inner.emit(CoreEvent::Album(AlbumEvent::PhotoAdded {
            album: album.clone(),
            uri: uri.to_string(),
        }));

        if !state.source.is_search() {
            let source = state.source.clone();
            let result = self.show(&mut state, source).await;
            self.report(result)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Load `source`, make it current and publish. On error nothing changes.
    async fn show(&self, state: &mut ViewState, source: ViewSource) -> Result<()> {
        let uris = self.load(&source).await?;

        let visible: HashSet<&String> = uris.iter().collect();
        state.tags.retain(|uri, _| visible.contains(uri));
        state.generation += 1;
        state.source = source;
        state.uris = uris;

        debug!(
            generation = state.generation,
            source = %state.source.label(),
            photos = state.uris.len(),
            "Collection view changed"
        );
        self.inner.publish(state);
        self.inner
            .emit(CoreEvent::Collection(CollectionEvent::SourceChanged {
                source: state.source.label(),
                photo_count: state.uris.len(),
            }));
        self.spawn_prefetch(state.generation, state.uris.clone());
        Ok(())
    }

    async fn load(&self, source: &ViewSource) -> Result<Vec<String>> {
        match source {
            ViewSource::Gallery => {
                let listing = self.inner.gallery.all_photos().await?;
                if listing.permission_denied {
                    self.inner
                        .events
                        .notify(Notice::warning("Permission denied. Cannot load images."));
                }
                Ok(listing.uris)
            }
            ViewSource::Album(name) => Ok(self.inner.albums.photos_of(name).await),
            ViewSource::SearchResults { query, .. } => {
                let records = self.inner.tags.search_by_tag(query).await?;
                let mut seen = HashSet::new();
                Ok(records
                    .into_iter()
                    .map(|record| record.uri)
                    .filter(|uri| seen.insert(uri.clone()))
                    .collect())
            }
        }
    }

    fn spawn_prefetch(&self, generation: u64, uris: Vec<String>) {
        if !self.inner.prefetch_tags || uris.is_empty() {
            return;
        }

        let controller = Arc::downgrade(&self.inner);
        let repo = Arc::clone(&self.inner.tags);

        tokio::spawn(async move {
            let repo = &repo;
            let lookups = uris
                .iter()
                .map(|uri| async move { (uri, repo.find_by_uri(uri).await) });

            let mut tags = HashMap::new();
            for (uri, result) in join_all(lookups).await {
                match result {
                    Ok(Some(record)) if record.has_tags() => {
                        tags.insert(uri.clone(), record.tag);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "Tag prefetch lookup failed"),
                }
            }

            let Some(inner) = controller.upgrade() else {
                debug!("Collection controller gone; dropping prefetched tags");
                return;
            };
            let mut state = inner.state.lock().await;
            if state.generation != generation {
                debug!(generation, current = state.generation, "Stale tag prefetch");
                return;
            }
            state.tags = tags;
            inner.publish(&state);
        });
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "Collection command failed");
            self.inner.events.notify(Notice::warning(e.user_message()));
        }
        result
    }
}
