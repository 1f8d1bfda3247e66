//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the gallery core and the
//! platform-specific pieces it cannot own: the photo index, the preference
//! store, audio output and app lifecycle. Each trait is a capability that must
//! be implemented differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Photos & Storage
//! - [`MediaIndex`](media::MediaIndex) - Read-only device photo index with permission gating
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences (album persistence)
//!
//! ### Platform Integration
//! - [`AudioPlayer`](playback::AudioPlayer) - Optional slideshow background music
//! - [`LifecycleObserver`](background::LifecycleObserver) - App foreground/background transitions
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Android  | host-injected       | 📋 Planned |
//! | iOS      | host-injected       | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! let media_index = config.media_index
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "MediaIndex".to_string(),
//!         message: "No media index provided. \
//!                  Desktop: enable the 'desktop-shims' feature. \
//!                  Mobile: inject the platform photo index.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert their native errors and keep messages
//! actionable. A denied photo permission is reported as
//! `BridgeError::PermissionDenied`, which the core turns into an empty gallery
//! plus a notice rather than a failure.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across async
//! tasks behind `Arc`.

pub mod background;
pub mod error;
pub mod log;
pub mod media;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{MediaEntry, MediaIndex, PermissionStatus};
pub use playback::{AudioOptions, AudioPlayer, AudioSessionId, AudioSource, AudioState};
pub use storage::{SettingsStore, SettingsTransaction};
pub use time::{Clock, SystemClock};
