//! # Library Management Module
//!
//! Owns the persistent side of the photo gallery.
//!
//! ## Overview
//!
//! This module manages:
//! - The album directory, persisted in a key-value settings store
//! - Photo tag records in SQLite, with schema migrations
//! - The device gallery listing behind the "All Photos" album

pub mod albums;
pub mod db;
pub mod error;
pub mod gallery;
pub mod models;
pub mod repositories;

pub use albums::AlbumDirectory;
pub use error::{LibraryError, Result};
pub use gallery::{GalleryListing, GallerySource};
pub use models::{Album, PhotoTag, ALL_PHOTOS};
pub use repositories::{PhotoTagRepository, SqlitePhotoTagRepository};
