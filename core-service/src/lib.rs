//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (media index,
//! settings store, audio, lifecycle) into the shared gallery core. Desktop
//! apps typically enable the `desktop-shims` feature, which lets
//! `CoreConfig` fall back to the `bridge-desktop` implementations.
//!
//! Storage handles are created once in [`CoreService::bootstrap`] and shared
//! through `Arc`; there is no global database instance.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .database_path("/data/gallery/tags.db")
//!     .build()?;
//! let core = CoreService::bootstrap(config).await?;
//!
//! let collection = core.collection();
//! collection.refresh().await?;
//! collection.search("beach").await?;
//!
//! let launch = core.prepare_slideshow()?;
//! let session = core.start_slideshow(&launch).await?;
//! ```

pub mod collection;
pub mod error;
pub mod tag_editor;

pub use collection::{
    CollectionController, CollectionSnapshot, DisplayItem, GridItem, ListItem, ViewMode,
    ViewSource,
};
pub use error::{CoreError, Result};
pub use tag_editor::TagEditor;

use std::sync::Arc;

use core_library::db::{create_pool, DatabaseConfig};
use core_library::{AlbumDirectory, GallerySource, PhotoTagRepository, SqlitePhotoTagRepository};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Notice};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_slideshow::{
    HandoffCache, SessionDeps, SlideshowEngine, SlideshowError, SlideshowLaunch, SlideshowSession,
};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    config: CoreConfig,
    pool: SqlitePool,
    events: EventBus,
    albums: Arc<AlbumDirectory>,
    tags: Arc<dyn PhotoTagRepository>,
    handoff: Arc<HandoffCache>,
    collection: CollectionController,
}

impl CoreService {
    /// Validate `config`, open the tag database and load the album directory.
    ///
    /// The collection starts on an empty gallery; call
    /// [`CollectionController::refresh`] once the host is ready to ask for
    /// photo permission.
    ///
    /// A configured `logger_sink` is installed as the global subscriber unless
    /// the host already set one up.
    #[instrument(skip(config))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(sink) = &config.logger_sink {
            let logging = LoggingConfig::default().with_logger_sink(sink.clone());
            if let Err(e) = init_logging(logging) {
                debug!(error = %e, "Keeping existing logging setup");
            }
        }

        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        Self::assemble(config, pool).await
    }

    /// Bootstrap on an existing pool (migrations must already be applied).
    pub async fn with_pool(config: CoreConfig, pool: SqlitePool) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, pool).await
    }

    async fn assemble(config: CoreConfig, pool: SqlitePool) -> Result<Self> {
        let events = EventBus::default();
        let albums = Arc::new(AlbumDirectory::load(config.album_store.clone()).await?);
        let gallery = Arc::new(GallerySource::new(config.media_index.clone()));
        let tags: Arc<dyn PhotoTagRepository> =
            Arc::new(SqlitePhotoTagRepository::new(pool.clone()));

        let collection = CollectionController::new(
            albums.clone(),
            gallery,
            tags.clone(),
            events.clone(),
            config.features.enable_tag_prefetch,
        );

        info!("Gallery core ready");
        Ok(Self {
            inner: Arc::new(CoreInner {
                config,
                pool,
                events,
                albums,
                tags,
                handoff: Arc::new(HandoffCache::new()),
                collection,
            }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn collection(&self) -> &CollectionController {
        &self.inner.collection
    }

    pub fn albums(&self) -> Arc<AlbumDirectory> {
        Arc::clone(&self.inner.albums)
    }

    pub fn handoff_cache(&self) -> Arc<HandoffCache> {
        Arc::clone(&self.inner.handoff)
    }

    /// Open the tag editor for a photo, creating its tag record on first use.
    pub async fn open_tag_editor(&self, uri: &str) -> Result<TagEditor> {
        TagEditor::open(self.inner.tags.clone(), self.inner.events.clone(), uri).await
    }

    /// Park the photos currently on screen and return the launch handle for
    /// the slideshow screen.
    pub fn prepare_slideshow(&self) -> Result<SlideshowLaunch> {
        let uris = self.inner.collection.snapshot().uris;
        if uris.is_empty() {
            let error = SlideshowError::EmptyList;
            self.inner.events.notify(Notice::warning(error.user_message()));
            return Err(error.into());
        }
        Ok(SlideshowLaunch::via_cache(&self.inner.handoff, uris))
    }

    /// Resolve `launch` and start playing it.
    ///
    /// Music plays only when background audio is enabled and both a player
    /// and a track are configured.
    pub async fn start_slideshow(&self, launch: &SlideshowLaunch) -> Result<SlideshowSession> {
        let config = &self.inner.config;
        let engine = launch
            .resolve(&self.inner.handoff)
            .and_then(|uris| SlideshowEngine::new(uris, &config.slideshow));
        let engine = match engine {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "Slideshow could not start");
                self.inner.events.notify(Notice::warning(e.user_message()));
                return Err(e.into());
            }
        };

        let mut deps = SessionDeps::new(self.inner.events.clone());
        if config.features.enable_background_audio {
            if let (Some(player), Some(source)) =
                (&config.audio_player, &config.slideshow.audio_source)
            {
                deps = deps.with_audio(player.clone(), source.clone());
            }
        }
        if let Some(observer) = &config.lifecycle_observer {
            deps = deps.with_lifecycle(observer.clone());
        }
        if let Some(token) = &launch.token {
            deps = deps.with_handoff(self.inner.handoff.clone(), token.clone());
        }

        Ok(SlideshowSession::start(engine, deps).await?)
    }

    /// Close the tag database.
    pub async fn shutdown(&self) {
        self.inner.pool.close().await;
        info!("Gallery core shut down");
    }
}
