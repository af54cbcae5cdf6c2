//! # Library Store
//!
//! Owns the canonical song/playlist database and provides repository
//! patterns for data access.
//!
//! ## Overview
//!
//! This crate manages:
//! - SQLite schema and migrations
//! - Repository patterns for songs and playlists
//! - Transactional playlist membership with aggregate maintenance
//! - Live queries: subscription-based snapshots that refresh after every
//!   committed mutation

pub mod db;
pub mod error;
pub mod live;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::{LibraryError, Result};
pub use live::LiveQuery;
pub use models::{Playlist, PlaylistSongEntry, PlaylistWithSongs, Song};
pub use store::LibraryStore;
