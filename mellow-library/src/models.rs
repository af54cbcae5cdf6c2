//! Domain models for the music library
//!
//! Rich domain models with validation and database mapping. Timestamps are
//! Unix milliseconds throughout, matching the persisted schema.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Current time as Unix milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// Song
// =============================================================================

/// A playable track backed by a cloud-drive file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Song {
    /// Unique identifier, immutable once created
    pub id: String,
    /// Track title
    pub title: String,
    /// Artist name (may be blank; see [`Song::display_artist`])
    pub artist: String,
    /// Album name (may be blank; see [`Song::display_album`])
    pub album: String,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// Identifier of the backing file in the cloud drive
    pub drive_file_id: String,
    /// Resolved direct download URL, if known
    pub download_url: Option<String>,
    /// Album art image URL
    pub album_art_url: Option<String>,
    /// Music genre
    pub genre: Option<String>,
    /// Release year
    pub year: Option<i32>,
    /// Track position on the album
    pub track_number: Option<i32>,
    /// Bitrate in kbps
    pub bitrate: Option<i32>,
    /// File size in bytes
    pub file_size: i64,
    /// MIME type reported by the drive
    pub mime_type: String,
    /// When the song entered the library, Unix milliseconds
    pub date_added: i64,
    /// Last playback start, Unix milliseconds
    pub last_played: Option<i64>,
    /// Number of completed play starts, monotonic
    pub play_count: i64,
    /// Favorite flag
    pub is_favorite: bool,
    /// Whether a local copy exists
    pub is_downloaded: bool,
    /// Path of the local copy, when downloaded
    pub local_path: Option<String>,
}

impl Song {
    /// Create a song with the required fields; everything else defaults.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_ms: i64,
        drive_file_id: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_ms,
            drive_file_id: drive_file_id.into(),
            download_url: None,
            album_art_url: None,
            genre: None,
            year: None,
            track_number: None,
            bitrate: None,
            file_size: 0,
            mime_type: mime_type.into(),
            date_added: now_ms(),
            last_played: None,
            play_count: 0,
            is_favorite: false,
            is_downloaded: false,
            local_path: None,
        }
    }

    /// Title for display; blank titles render as "Unknown Title".
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Unknown Title"
        } else {
            &self.title
        }
    }

    /// Artist for display; blank artists render as "Unknown Artist".
    pub fn display_artist(&self) -> &str {
        if self.artist.trim().is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        }
    }

    /// Album for display; blank albums render as "Unknown Album".
    pub fn display_album(&self) -> &str {
        if self.album.trim().is_empty() {
            "Unknown Album"
        } else {
            &self.album
        }
    }

    /// Duration formatted as "m:ss".
    pub fn duration_formatted(&self) -> String {
        let minutes = self.duration_ms / 60_000;
        let seconds = (self.duration_ms % 60_000) / 1000;
        format!("{}:{:02}", minutes, seconds)
    }

    /// File size formatted with a binary unit suffix.
    pub fn file_size_formatted(&self) -> String {
        const KIB: i64 = 1024;
        const MIB: i64 = 1024 * 1024;
        if self.file_size >= MIB {
            format!("{:.1} MB", self.file_size as f64 / MIB as f64)
        } else if self.file_size >= KIB {
            format!("{:.1} KB", self.file_size as f64 / KIB as f64)
        } else {
            format!("{} B", self.file_size)
        }
    }

    /// Validate song data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Song id cannot be empty".to_string());
        }

        if self.duration_ms < 0 {
            return Err("Song duration cannot be negative".to_string());
        }

        if self.play_count < 0 {
            return Err("Play count cannot be negative".to_string());
        }

        if self.drive_file_id.trim().is_empty() {
            return Err("Song must reference a drive file".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, ordered collection of songs.
///
/// `song_count` and `duration_ms` are denormalized aggregates over the
/// membership relation; the store keeps them consistent with every
/// membership mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Playlist {
    /// Unique identifier
    pub id: String,
    /// Playlist name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Cover art image URL
    pub cover_art_url: Option<String>,
    /// Cached member count
    pub song_count: i64,
    /// Cached total duration in milliseconds
    pub duration_ms: i64,
    /// Creation time, Unix milliseconds
    pub date_created: i64,
    /// Last modification time, Unix milliseconds
    pub date_modified: i64,
    /// Built-in playlists (Favorites, Recently Played, Most Played)
    pub is_system: bool,
}

impl Playlist {
    /// Reserved identifier of the Favorites system playlist.
    pub const FAVORITES_ID: &'static str = "favorites";
    /// Reserved identifier of the Recently Played system playlist.
    pub const RECENTLY_PLAYED_ID: &'static str = "recently_played";
    /// Reserved identifier of the Most Played system playlist.
    pub const MOST_PLAYED_ID: &'static str = "most_played";

    /// Create a new user playlist with a generated identifier.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            cover_art_url: None,
            song_count: 0,
            duration_ms: 0,
            date_created: now,
            date_modified: now,
            is_system: false,
        }
    }

    fn system(id: &str, name: &str, description: &str) -> Self {
        let now = now_ms();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            cover_art_url: None,
            song_count: 0,
            duration_ms: 0,
            date_created: now,
            date_modified: now,
            is_system: true,
        }
    }

    /// The built-in Favorites playlist.
    pub fn favorites() -> Self {
        Self::system(Self::FAVORITES_ID, "Favorites", "Your favorite songs")
    }

    /// The built-in Recently Played playlist.
    pub fn recently_played() -> Self {
        Self::system(
            Self::RECENTLY_PLAYED_ID,
            "Recently Played",
            "Songs you've played recently",
        )
    }

    /// The built-in Most Played playlist.
    pub fn most_played() -> Self {
        Self::system(Self::MOST_PLAYED_ID, "Most Played", "Your most played songs")
    }

    /// Total duration formatted as hours and minutes.
    pub fn duration_formatted(&self) -> String {
        let hours = self.duration_ms / 3_600_000;
        let minutes = (self.duration_ms % 3_600_000) / 60_000;
        if hours > 0 {
            format!("{} hr {} min", hours, minutes)
        } else if minutes > 0 {
            format!("{} min", minutes)
        } else {
            "0 min".to_string()
        }
    }

    /// Validate playlist data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Playlist id cannot be empty".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }

        if self.song_count < 0 {
            return Err("Song count cannot be negative".to_string());
        }

        if self.duration_ms < 0 {
            return Err("Playlist duration cannot be negative".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Membership
// =============================================================================

/// One playlist-to-song association row.
///
/// `position` is zero-based and unique within a playlist; appends go to
/// `max(position) + 1`. Gaps after removals are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaylistSongEntry {
    pub playlist_id: String,
    pub song_id: String,
    /// When the song was added, Unix milliseconds
    pub added_at: i64,
    /// Zero-based position within the playlist
    pub position: i64,
}

impl PlaylistSongEntry {
    pub fn new(playlist_id: impl Into<String>, song_id: impl Into<String>, position: i64) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            song_id: song_id.into(),
            added_at: now_ms(),
            position,
        }
    }
}

/// A playlist together with its member songs in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistWithSongs {
    pub playlist: Playlist,
    pub songs: Vec<Song>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_song() -> Song {
        Song::new(
            "song-1",
            "Dreams Come True",
            "Harmony Wave",
            "Eternal Echoes",
            245_000,
            "drive-1",
            "audio/mpeg",
        )
    }

    #[test]
    fn test_song_new_defaults() {
        let song = sample_song();
        assert_eq!(song.play_count, 0);
        assert!(!song.is_favorite);
        assert!(!song.is_downloaded);
        assert!(song.date_added > 0);
        assert!(song.validate().is_ok());
    }

    #[test]
    fn test_song_display_fallbacks() {
        let mut song = sample_song();
        assert_eq!(song.display_title(), "Dreams Come True");

        song.title = "  ".to_string();
        song.artist = String::new();
        song.album = String::new();
        assert_eq!(song.display_title(), "Unknown Title");
        assert_eq!(song.display_artist(), "Unknown Artist");
        assert_eq!(song.display_album(), "Unknown Album");
    }

    #[test]
    fn test_song_duration_formatted() {
        let mut song = sample_song();
        song.duration_ms = 245_000;
        assert_eq!(song.duration_formatted(), "4:05");

        song.duration_ms = 0;
        assert_eq!(song.duration_formatted(), "0:00");

        song.duration_ms = 61_000;
        assert_eq!(song.duration_formatted(), "1:01");
    }

    #[test]
    fn test_song_file_size_formatted() {
        let mut song = sample_song();
        song.file_size = 512;
        assert_eq!(song.file_size_formatted(), "512 B");

        song.file_size = 10 * 1024;
        assert_eq!(song.file_size_formatted(), "10.0 KB");

        song.file_size = 5 * 1024 * 1024 + 256 * 1024;
        assert_eq!(song.file_size_formatted(), "5.3 MB");
    }

    #[test]
    fn test_song_validation() {
        let mut song = sample_song();
        assert!(song.validate().is_ok());

        song.duration_ms = -1;
        assert!(song.validate().is_err());

        song.duration_ms = 1000;
        song.play_count = -1;
        assert!(song.validate().is_err());

        song.play_count = 0;
        song.id = String::new();
        assert!(song.validate().is_err());
    }

    #[test]
    fn test_playlist_new() {
        let playlist = Playlist::new("My Chill Mix");
        assert!(!playlist.is_system);
        assert_eq!(playlist.song_count, 0);
        assert_eq!(playlist.duration_ms, 0);
        assert!(playlist.validate().is_ok());
        assert!(!playlist.id.is_empty());
    }

    #[test]
    fn test_system_playlists() {
        let favorites = Playlist::favorites();
        assert_eq!(favorites.id, Playlist::FAVORITES_ID);
        assert!(favorites.is_system);

        let recent = Playlist::recently_played();
        assert_eq!(recent.id, Playlist::RECENTLY_PLAYED_ID);

        let most = Playlist::most_played();
        assert_eq!(most.id, Playlist::MOST_PLAYED_ID);
    }

    #[test]
    fn test_playlist_duration_formatted() {
        let mut playlist = Playlist::new("Test");
        assert_eq!(playlist.duration_formatted(), "0 min");

        playlist.duration_ms = 25 * 60_000;
        assert_eq!(playlist.duration_formatted(), "25 min");

        playlist.duration_ms = 2 * 3_600_000 + 14 * 60_000;
        assert_eq!(playlist.duration_formatted(), "2 hr 14 min");
    }

    #[test]
    fn test_playlist_validation() {
        let mut playlist = Playlist::new("Valid");
        assert!(playlist.validate().is_ok());

        playlist.name = "".to_string();
        assert!(playlist.validate().is_err());

        playlist.name = "Valid".to_string();
        playlist.song_count = -1;
        assert!(playlist.validate().is_err());
    }

    #[test]
    fn test_membership_entry() {
        let entry = PlaylistSongEntry::new("playlist-1", "song-1", 3);
        assert_eq!(entry.position, 3);
        assert!(entry.added_at > 0);
    }
}
