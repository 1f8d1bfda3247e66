//! # Core Configuration Module
//!
//! Provides configuration management for the photo gallery core.
//!
//! ## Overview
//!
//! A `CoreConfig` is assembled with [`CoreConfigBuilder`] and holds every
//! bridge and setting the services need. Validation is fail-fast: a missing
//! capability or an out-of-range slideshow setting is reported by `build()`
//! rather than at first use.
//!
//! ## Required Dependencies
//!
//! - `database_path` - SQLite file backing the photo tag store
//! - `SettingsStore` - key-value preferences holding the album directory
//! - `MediaIndex` - the device gallery
//!
//! ## Optional Dependencies
//!
//! - `AudioPlayer` - background music during slideshows
//! - `LifecycleObserver` - pauses slideshow audio while backgrounded
//! - `LoggerSink` - forwards tracing output to the host
//!
//! When the `desktop-shims` feature is enabled, a SQLite-backed album store
//! next to the database and a `~/Pictures` scanner are injected when the host
//! does not provide its own.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, EndOfList};
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/gallery.db")
//!     .slide_duration(Duration::from_secs(5))
//!     .end_of_list(EndOfList::Loop)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No database path
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AudioPlayer, AudioSource, LifecycleObserver, LoggerSink, MediaIndex, SettingsStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Shortest slide duration accepted.
pub const MIN_SLIDE_DURATION: Duration = Duration::from_secs(1);

/// Longest slide duration accepted.
pub const MAX_SLIDE_DURATION: Duration = Duration::from_secs(10);

/// Slide duration used when none is configured.
pub const DEFAULT_SLIDE_DURATION: Duration = Duration::from_secs(3);

/// Crossfade length between slides.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(500);

/// Core configuration for the photo gallery core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file holding photo tags
    pub database_path: PathBuf,

    /// Key-value store backing the album directory
    pub album_store: Arc<dyn SettingsStore>,

    /// Device gallery
    pub media_index: Arc<dyn MediaIndex>,

    /// Background music player (optional)
    pub audio_player: Option<Arc<dyn AudioPlayer>>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Host log sink (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    pub slideshow: SlideshowConfig,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("album_store", &"SettingsStore { ... }")
            .field("media_index", &"MediaIndex { ... }")
            .field(
                "audio_player",
                &self.audio_player.as_ref().map(|_| "AudioPlayer { ... }"),
            )
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("slideshow", &self.slideshow)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Play background music during slideshows (requires an `AudioPlayer`
    /// and an audio source)
    pub enable_background_audio: bool,

    /// Load tag summaries for visible photos in the background
    pub enable_tag_prefetch: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_background_audio: false,
            enable_tag_prefetch: true,
        }
    }
}

/// What the slideshow does after the last slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum EndOfList {
    /// Stop, release audio and report that the show finished
    #[default]
    StopAtEnd,
    /// Wrap around to the first slide
    Loop,
}

/// Slideshow timing and presentation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideshowConfig {
    /// Time each slide stays on screen
    pub slide_duration: Duration,

    pub end_of_list: EndOfList,

    /// Crossfade between slides instead of cutting
    pub crossfade: bool,

    /// Crossfade length
    pub transition: Duration,

    /// Background music, played looping while the show runs
    pub audio_source: Option<AudioSource>,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            slide_duration: DEFAULT_SLIDE_DURATION,
            end_of_list: EndOfList::default(),
            crossfade: true,
            transition: DEFAULT_TRANSITION,
            audio_source: None,
        }
    }
}

impl SlideshowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.slide_duration < MIN_SLIDE_DURATION || self.slide_duration > MAX_SLIDE_DURATION {
            return Err(Error::Config(format!(
                "Slide duration must be between {}s and {}s, got {}ms",
                MIN_SLIDE_DURATION.as_secs(),
                MAX_SLIDE_DURATION.as_secs(),
                self.slide_duration.as_millis()
            )));
        }

        if self.crossfade && self.transition >= self.slide_duration {
            return Err(Error::Config(
                "Crossfade transition must be shorter than the slide duration".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Slideshow settings are in range
    /// - Feature flags are consistent with the injected bridges
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        self.slideshow.validate()?;

        if self.features.enable_background_audio {
            if self.audio_player.is_none() {
                return Err(Error::Config(
                    "Background audio enabled but no AudioPlayer provided. \
                     Disable the feature or inject an AudioPlayer implementation."
                        .to_string(),
                ));
            }
            if self.slideshow.audio_source.is_none() {
                return Err(Error::Config(
                    "Background audio enabled but no audio source configured. \
                     Use .audio_source() to choose a track."
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn album_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "A SettingsStore is required to persist albums. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqliteSettingsStore. \
                 Mobile: inject the platform preference store (SharedPreferences/UserDefaults)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn media_index_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaIndex".to_string(),
        message: "A MediaIndex is required to list device photos. \
                 Desktop: enable the 'desktop-shims' feature to scan the user's pictures folder. \
                 Mobile: inject the platform media store query."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_album_store(database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let candidate = database_path
        .parent()
        .map(|parent| parent.join("albums.db"))
        .unwrap_or_else(|| PathBuf::from("albums.db"));

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Config(format!(
                    "Failed to create Tokio runtime for default album store: {}",
                    e
                ))
            })?;

        Ok(runtime.block_on(SqliteSettingsStore::new(path))?)
    };

    // block_on panics inside a runtime, so hop to a plain thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(candidate))
            .join()
            .map_err(|_| {
                Error::Config("Thread panicked while creating default album store".to_string())
            })??,
        Err(_) => init_store(candidate)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_album_store(_database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(album_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_index() -> Result<Arc<dyn MediaIndex>> {
    use bridge_desktop::FsMediaIndex;

    let index = FsMediaIndex::user_pictures().ok_or_else(|| Error::CapabilityMissing {
        capability: "MediaIndex".to_string(),
        message: "No pictures directory found for the current user. \
                 Inject a MediaIndex rooted at the folder to browse."
            .to_string(),
    })?;

    let index: Arc<dyn MediaIndex> = Arc::new(index);
    Ok(index)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_index() -> Result<Arc<dyn MediaIndex>> {
    Err(media_index_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    album_store: Option<Arc<dyn SettingsStore>>,
    media_index: Option<Arc<dyn MediaIndex>>,
    audio_player: Option<Arc<dyn AudioPlayer>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    slideshow: SlideshowConfig,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/data/gallery.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the key-value store that persists albums.
    ///
    /// On Android this is the app's shared preferences; on desktop the
    /// default is a SQLite file next to the database.
    pub fn album_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.album_store = Some(store);
        self
    }

    pub fn media_index(mut self, index: Arc<dyn MediaIndex>) -> Self {
        self.media_index = Some(index);
        self
    }

    pub fn audio_player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.audio_player = Some(player);
        self
    }

    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Sets how long each slide is shown.
    ///
    /// Must be between 1 and 10 seconds. Default: 3 seconds
    pub fn slide_duration(mut self, duration: Duration) -> Self {
        self.slideshow.slide_duration = duration;
        self
    }

    /// Default: [`EndOfList::StopAtEnd`]
    pub fn end_of_list(mut self, policy: EndOfList) -> Self {
        self.slideshow.end_of_list = policy;
        self
    }

    pub fn crossfade(mut self, enabled: bool) -> Self {
        self.slideshow.crossfade = enabled;
        self
    }

    /// Sets the track played during slideshows.
    pub fn audio_source(mut self, source: AudioSource) -> Self {
        self.slideshow.audio_source = Some(source);
        self
    }

    /// Replaces all slideshow settings at once.
    pub fn slideshow(mut self, slideshow: SlideshowConfig) -> Self {
        self.slideshow = slideshow;
        self
    }

    /// Enables or disables slideshow background music.
    ///
    /// Requires an `AudioPlayer` and an audio source.
    ///
    /// Default: false
    pub fn enable_background_audio(mut self, enabled: bool) -> Self {
        self.features.enable_background_audio = enabled;
        self
    }

    /// Default: true
    pub fn enable_tag_prefetch(mut self, enabled: bool) -> Self {
        self.features.enable_tag_prefetch = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The database path is missing
    /// - A required bridge is missing and no desktop default applies
    /// - Slideshow settings are out of range
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let album_store = match self.album_store {
            Some(store) => store,
            None => provide_default_album_store(&database_path)?,
        };

        let media_index = match self.media_index {
            Some(index) => index,
            None => provide_default_media_index()?,
        };

        let config = CoreConfig {
            database_path,
            album_store,
            media_index,
            audio_player: self.audio_player,
            lifecycle_observer: self.lifecycle_observer,
            logger_sink: self.logger_sink,
            slideshow: self.slideshow,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
