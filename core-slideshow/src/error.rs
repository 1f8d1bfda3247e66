//! # Slideshow Error Types

use bridge_traits::BridgeError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideshowError {
    /// A session needs at least one photo.
    #[error("No images available for slideshow")]
    EmptyList,

    /// Every candidate URI was missing or malformed.
    #[error("No valid images for slideshow")]
    NoValidImages,

    #[error("Slide duration out of range: {0:?} (expected 1s to 10s)")]
    InvalidDuration(Duration),

    #[error("Slider position out of range: {0} (expected 0 to 9)")]
    InvalidSliderPosition(u8),

    /// The session task has already shut down.
    #[error("Slideshow session is closed")]
    SessionClosed,

    #[error("Audio error: {0}")]
    Audio(#[from] BridgeError),
}

impl SlideshowError {
    /// Short message suitable for a transient on-screen notice.
    pub fn user_message(&self) -> String {
        match self {
            SlideshowError::EmptyList | SlideshowError::NoValidImages => self.to_string(),
            SlideshowError::InvalidDuration(_) | SlideshowError::InvalidSliderPosition(_) => {
                "Slide duration must be between 1 and 10 seconds".to_string()
            }
            SlideshowError::SessionClosed => "Slideshow already closed".to_string(),
            SlideshowError::Audio(_) => "Background music unavailable".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SlideshowError>;
