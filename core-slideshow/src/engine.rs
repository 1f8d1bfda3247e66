//! # Slideshow Engine
//!
//! Pure state machine for a slideshow over an immutable list of photo URIs.
//! It owns no timer: [`SlideshowSession`](crate::session::SlideshowSession)
//! drives [`SlideshowEngine::advance`] from its deadline and restarts that
//! deadline whenever [`SlideshowEngine::is_playing`] holds after a manual move.
//!
//! ```text
//!            start                 pause
//!  Stopped ─────────▶ Playing ─────────────▶ Paused
//!     ▲                 │  ▲                   │
//!     │ stop / finish   │  └───── start ───────┘
//!     └─────────────────┘
//! ```
//!
//! Manual `next`/`previous` clamp at both ends. Only the timer-driven
//! `advance` looks at [`EndOfList`].

use crate::error::{Result, SlideshowError};
use core_runtime::config::{
    EndOfList, SlideshowConfig, DEFAULT_SLIDE_DURATION, MAX_SLIDE_DURATION, MIN_SLIDE_DURATION,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideshowState {
    Stopped,
    Playing,
    Paused,
}

/// How the host should animate into the current slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Crossfade(Duration),
    Cut,
}

/// Validated per-slide duration (1 to 10 whole or fractional seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlideDuration(Duration);

impl SlideDuration {
    pub fn new(duration: Duration) -> Result<Self> {
        if duration < MIN_SLIDE_DURATION || duration > MAX_SLIDE_DURATION {
            return Err(SlideshowError::InvalidDuration(duration));
        }
        Ok(Self(duration))
    }

    /// Map a speed slider position (0..=9) to 1..=10 seconds.
    pub fn from_slider(position: u8) -> Result<Self> {
        if position > 9 {
            return Err(SlideshowError::InvalidSliderPosition(position));
        }
        Self::new(Duration::from_secs(u64::from(position) + 1))
    }

    /// Inverse of [`from_slider`](Self::from_slider), rounding down.
    pub fn slider_position(self) -> u8 {
        (self.0.as_secs().saturating_sub(1)).min(9) as u8
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for SlideDuration {
    fn default() -> Self {
        Self(DEFAULT_SLIDE_DURATION)
    }
}

impl fmt::Display for SlideDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs_f32())
    }
}

/// What a timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved forward to `index`
    Advanced { index: usize },
    /// Looped from the last slide back to the first
    Wrapped,
    /// Stopped on the last slide
    Finished,
    /// Not playing; nothing changed
    Idle,
}

#[derive(Debug, Clone)]
pub struct SlideshowEngine {
    uris: Vec<String>,
    index: usize,
    state: SlideshowState,
    slide_duration: SlideDuration,
    end_of_list: EndOfList,
    transition: Transition,
}

impl SlideshowEngine {
    /// Build a stopped engine positioned on the first slide.
    ///
    /// # Errors
    /// - `EmptyList` when `uris` is empty
    /// - `InvalidDuration` when the configured duration is out of range
    pub fn new(uris: Vec<String>, config: &SlideshowConfig) -> Result<Self> {
        if uris.is_empty() {
            return Err(SlideshowError::EmptyList);
        }

        let transition = if config.crossfade {
            Transition::Crossfade(config.transition)
        } else {
            Transition::Cut
        };

        Ok(Self {
            uris,
            index: 0,
            state: SlideshowState::Stopped,
            slide_duration: SlideDuration::new(config.slide_duration)?,
            end_of_list: config.end_of_list,
            transition,
        })
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_uri(&self) -> &str {
        &self.uris[self.index]
    }

    pub fn state(&self) -> SlideshowState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SlideshowState::Playing
    }

    pub fn slide_duration(&self) -> SlideDuration {
        self.slide_duration
    }

    pub fn end_of_list(&self) -> EndOfList {
        self.end_of_list
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// One-based position label, e.g. `"2 / 5"`.
    pub fn counter_label(&self) -> String {
        format!("{} / {}", self.index + 1, self.uris.len())
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.uris.len()
    }

    /// Returns whether the state changed.
    pub fn start(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.state = SlideshowState::Playing;
        true
    }

    /// Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = SlideshowState::Paused;
        true
    }

    pub fn stop(&mut self) {
        self.state = SlideshowState::Stopped;
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        if !self.is_playing() {
            return AdvanceOutcome::Idle;
        }

        if !self.is_last() {
            self.index += 1;
            return AdvanceOutcome::Advanced { index: self.index };
        }

        match self.end_of_list {
            EndOfList::StopAtEnd => {
                self.state = SlideshowState::Stopped;
                AdvanceOutcome::Finished
            }
            EndOfList::Loop => {
                self.index = 0;
                AdvanceOutcome::Wrapped
            }
        }
    }

    /// Step forward, clamped at the last slide. Returns whether it moved.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step back, clamped at the first slide. Returns whether it moved.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn set_slide_duration(&mut self, duration: SlideDuration) {
        self.slide_duration = duration;
    }
}
