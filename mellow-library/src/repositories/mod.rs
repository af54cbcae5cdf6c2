//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for data access. Traits
//! define the interface; `Sqlite*` types implement them with sqlx. All
//! operations return `Result<T>`; absent rows are `Ok(None)`/empty vectors,
//! never errors.

pub mod playlist;
pub mod song;

pub use playlist::{PlaylistRepository, SqlitePlaylistRepository};
pub use song::{SongRepository, SqliteSongRepository};
