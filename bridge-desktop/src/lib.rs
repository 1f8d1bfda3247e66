//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using an SQLite-backed key-value table (album persistence)
//! - `MediaIndex` scanning a pictures directory with `walkdir`
//! - `LifecycleObserver` driven by host window events
//!
//! There is no desktop `AudioPlayer`; slideshow music stays disabled unless
//! the host injects one.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsMediaIndex, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let albums = SqliteSettingsStore::new("data/albums.db".into()).await.unwrap();
//!     let gallery = FsMediaIndex::user_pictures().expect("no pictures dir");
//!
//!     // Use in core configuration
//! }
//! ```

mod lifecycle;
mod media;
mod settings;

pub use lifecycle::DesktopLifecycleObserver;
pub use media::FsMediaIndex;
pub use settings::SqliteSettingsStore;
