//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for relational data.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//!
//! ## Available Repositories
//!
//! - `PhotoTagRepository` - Per-photo tag records

pub mod photo_tag;

pub use photo_tag::{PhotoTagRepository, SqlitePhotoTagRepository};
