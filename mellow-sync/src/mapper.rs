//! Vendor-descriptor to domain-song mapping.
//!
//! The provider reports file facts (name, size, MIME type, links); nothing
//! more is known until the audio itself is inspected. Titles fall back to
//! the file-name stem; artist and album stay blank and render through the
//! display-normalized accessors. Re-syncing must never wipe user state, so
//! local fields (favorite flag, play stats, download state) are carried
//! over from the existing row.

use mellow_bridge::storage::RemoteFile;
use mellow_library::Song;

/// Extensions stripped from file names when deriving a title.
const STRIPPABLE_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "aac", "m4a", "ogg", "oga"];

/// Derive a display title from a file name by dropping a known audio
/// extension. Unknown extensions stay part of the title.
fn title_from_name(name: &str) -> String {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if !stem.is_empty() && STRIPPABLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return stem.to_string();
        }
    }
    name.to_string()
}

/// Build a library song from a remote file descriptor.
///
/// The drive file id doubles as the song id, which makes repeated syncs
/// idempotent upserts.
pub fn song_from_remote(file: &RemoteFile) -> Song {
    let mut song = Song::new(
        file.id.clone(),
        title_from_name(&file.name),
        "",
        "",
        0,
        file.id.clone(),
        file.mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    );

    song.file_size = file.size.unwrap_or(0);
    song.download_url = file.content_link.clone();
    song.album_art_url = file.thumbnail_link.clone();
    if let Some(created) = file.created_at {
        song.date_added = created;
    }

    song
}

/// Carry user-local state from an existing row onto a freshly mapped song.
pub fn merge_with_existing(mut fresh: Song, existing: &Song) -> Song {
    fresh.date_added = existing.date_added;
    fresh.last_played = existing.last_played;
    fresh.play_count = existing.play_count;
    fresh.is_favorite = existing.is_favorite;
    fresh.is_downloaded = existing.is_downloaded;
    fresh.local_path = existing.local_path.clone();

    // Tagged metadata beats the filename fallback
    if fresh.artist.is_empty() && !existing.artist.is_empty() {
        fresh.artist = existing.artist.clone();
    }
    if fresh.album.is_empty() && !existing.album.is_empty() {
        fresh.album = existing.album.clone();
    }
    if fresh.duration_ms == 0 && existing.duration_ms > 0 {
        fresh.duration_ms = existing.duration_ms;
    }

    fresh
}
