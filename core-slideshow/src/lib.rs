//! # Slideshow Module
//!
//! Auto-advancing fullscreen slideshow over a list of photo URIs.
//!
//! ## Components
//!
//! - [`SlideshowEngine`] - Pure index/state machine with clamped navigation
//! - [`SlideshowSession`] - Task that drives the engine from a timer, plays
//!   optional looping music and follows app lifecycle
//! - [`HandoffCache`] - Token-keyed parking spot for large photo lists
//!
//! ## Usage
//!
//! ```ignore
//! let cache = Arc::new(HandoffCache::new());
//! let launch = SlideshowLaunch::via_cache(&cache, uris);
//!
//! let uris = launch.resolve(&cache)?;
//! let engine = SlideshowEngine::new(uris, &config.slideshow)?;
//! let session = SlideshowSession::start(engine, SessionDeps::new(bus)).await?;
//! session.next().await?;
//! session.close(false).await?;
//! ```

pub mod engine;
pub mod error;
pub mod handoff;
pub mod session;

pub use engine::{AdvanceOutcome, SlideDuration, SlideshowEngine, SlideshowState, Transition};
pub use error::{Result, SlideshowError};
pub use handoff::{HandoffCache, HandoffToken, SlideshowLaunch};
pub use session::{SessionDeps, SlideshowCommand, SlideshowSession, SlideshowSnapshot};
