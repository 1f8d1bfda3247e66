//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-slideshow`). Host applications can
//! depend on `gallery-workspace` and enable the documented features without
//! wiring each crate individually:
//!
//! - `desktop-shims` (default): the full service with desktop bridges
//! - `slideshow-only`: just the slideshow engine and handoff cache

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "slideshow-only")]
pub use core_slideshow;
