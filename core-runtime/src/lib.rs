//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the photo gallery core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the library, slideshow and
//! service crates depend on. It establishes the logging conventions, the
//! fail-fast configuration builder and the broadcast channel used to surface
//! notices to host screens.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
