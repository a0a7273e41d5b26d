//! # Library Module
//!
//! Owns the durable store the response cache writes through to.
//!
//! ## Overview
//!
//! This module manages:
//! - Domain models for artists, shows, sources and tracks
//! - SQLite connection pooling and embedded migrations
//! - The [`RelistenStore`](store::RelistenStore) contract and its SQLite
//!   implementation

pub mod db;
pub mod error;
pub mod models;
pub mod store;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use error::{LibraryError, Result};
pub use store::{RelistenStore, SqliteRelistenStore};
