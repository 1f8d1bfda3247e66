//! Background audio bridge.
//!
//! The slideshow can loop a music track while images advance. Audio output is
//! entirely host-provided; the core only drives the lifecycle of a single
//! session through [`AudioPlayer`].

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Where the music comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSource {
    /// Asset shipped inside the application bundle (e.g. `res/raw`)
    Bundled { name: String },
    LocalFile { path: PathBuf },
    RemoteStream { url: String },
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Bundled { name } => write!(f, "bundled:{}", name),
            AudioSource::LocalFile { path } => write!(f, "file:{}", path.display()),
            AudioSource::RemoteStream { url } => write!(f, "{}", url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioOptions {
    pub looping: bool,
    /// Linear gain in `0.0..=1.0`
    pub volume: f32,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            looping: true,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioSessionId(Uuid);

impl AudioSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AudioSessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Prepared,
    Playing,
    Paused,
    Stopped,
}

/// Host audio engine used for slideshow music.
///
/// Calls for an unknown or already unloaded session should fail with
/// `BridgeError::OperationFailed` rather than panic.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn prepare(&self, source: AudioSource, options: AudioOptions)
        -> Result<AudioSessionId>;

    async fn play(&self, session: AudioSessionId) -> Result<()>;

    async fn pause(&self, session: AudioSessionId) -> Result<()>;

    async fn stop(&self, session: AudioSessionId) -> Result<()>;

    /// Release every resource held for the session.
    async fn unload(&self, session: AudioSessionId) -> Result<()>;

    async fn state(&self, session: AudioSessionId) -> Result<AudioState>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_loop() {
        let options = AudioOptions::default();
        assert!(options.looping);
        assert_eq!(options.volume, 1.0);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(AudioSessionId::new(), AudioSessionId::new());
    }

    #[test]
    fn test_source_display() {
        let source = AudioSource::Bundled {
            name: "background_music".to_string(),
        };
        assert_eq!(source.to_string(), "bundled:background_music");
    }
}
