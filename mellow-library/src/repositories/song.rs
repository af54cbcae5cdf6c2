//! Song repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{now_ms, Song};
use async_trait::async_trait;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};

const UPSERT_SONG_SQL: &str = r#"
    INSERT OR REPLACE INTO songs (
        id, title, artist, album, duration_ms, drive_file_id, download_url,
        album_art_url, genre, year, track_number, bitrate, file_size,
        mime_type, date_added, last_played, play_count, is_favorite,
        is_downloaded, local_path
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn bind_song<'q>(
    q: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    song: &'q Song,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    q.bind(&song.id)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(song.duration_ms)
        .bind(&song.drive_file_id)
        .bind(&song.download_url)
        .bind(&song.album_art_url)
        .bind(&song.genre)
        .bind(song.year)
        .bind(song.track_number)
        .bind(song.bitrate)
        .bind(song.file_size)
        .bind(&song.mime_type)
        .bind(song.date_added)
        .bind(song.last_played)
        .bind(song.play_count)
        .bind(song.is_favorite)
        .bind(song.is_downloaded)
        .bind(&song.local_path)
}

/// Song repository interface for data access operations
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Insert or replace a song by identifier.
    async fn upsert(&self, song: &Song) -> Result<()>;

    /// Insert or replace a batch of songs in one transaction.
    ///
    /// Returns the number of rows written.
    async fn upsert_many(&self, songs: &[Song]) -> Result<u64>;

    /// Find a song by its ID. `Ok(None)` when absent.
    async fn find_by_id(&self, id: &str) -> Result<Option<Song>>;

    /// All songs, title ascending.
    async fn all(&self) -> Result<Vec<Song>>;

    /// Songs by exact artist match, ordered by album then track number.
    async fn by_artist(&self, artist: &str) -> Result<Vec<Song>>;

    /// Songs by exact album match, ordered by track number.
    async fn by_album(&self, album: &str) -> Result<Vec<Song>>;

    /// Songs by exact genre match, title ascending.
    async fn by_genre(&self, genre: &str) -> Result<Vec<Song>>;

    /// Case-insensitive substring search across title, artist, and album.
    async fn search(&self, needle: &str) -> Result<Vec<Song>>;

    /// All favorite songs, title ascending.
    async fn favorites(&self) -> Result<Vec<Song>>;

    /// Most recently played songs, descending, bounded by `limit`.
    async fn recently_played(&self, limit: u32) -> Result<Vec<Song>>;

    /// Most played songs, play count descending, bounded by `limit`.
    async fn most_played(&self, limit: u32) -> Result<Vec<Song>>;

    /// Distinct non-blank artist names, ascending.
    async fn artists(&self) -> Result<Vec<String>>;

    /// Distinct non-blank album names, ascending.
    async fn albums(&self) -> Result<Vec<String>>;

    /// Distinct non-blank genres, ascending.
    async fn genres(&self) -> Result<Vec<String>>;

    /// Set the favorite flag. Returns `false` when the song doesn't exist.
    async fn set_favorite(&self, song_id: &str, is_favorite: bool) -> Result<bool>;

    /// Record a completed play start: increments play count and stamps
    /// last-played. Returns `false` when the song doesn't exist.
    async fn record_play(&self, song_id: &str) -> Result<bool>;

    /// Update the local download state and cache path.
    async fn set_download_state(
        &self,
        song_id: &str,
        is_downloaded: bool,
        local_path: Option<&str>,
    ) -> Result<bool>;

    /// Delete a song by ID. Returns `false` when nothing was deleted.
    async fn delete_by_id(&self, song_id: &str) -> Result<bool>;

    /// Delete all songs. Returns the number of rows removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Total number of songs.
    async fn count(&self) -> Result<i64>;

    /// Sum of all song durations in milliseconds.
    async fn total_duration_ms(&self) -> Result<i64>;

    /// Sum of all song file sizes in bytes.
    async fn total_file_size(&self) -> Result<i64>;
}

/// SQLite implementation of SongRepository
#[derive(Clone)]
pub struct SqliteSongRepository {
    pool: SqlitePool,
}

impl SqliteSongRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validated(song: &Song) -> Result<()> {
        song.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Song".to_string(),
            message: e,
        })
    }

    /// Upsert inside an existing transaction (used by bulk writes).
    pub(crate) async fn upsert_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        song: &Song,
    ) -> Result<()> {
        Self::validated(song)?;
        bind_song(query(UPSERT_SONG_SQL), song)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SongRepository for SqliteSongRepository {
    async fn upsert(&self, song: &Song) -> Result<()> {
        Self::validated(song)?;
        bind_song(query(UPSERT_SONG_SQL), song)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_many(&self, songs: &[Song]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for song in songs {
            Self::upsert_in_tx(&mut tx, song).await?;
        }
        tx.commit().await?;
        Ok(songs.len() as u64)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Song>> {
        let song = query_as::<_, Song>("SELECT * FROM songs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(song)
    }

    async fn all(&self) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>("SELECT * FROM songs ORDER BY title ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(songs)
    }

    async fn by_artist(&self, artist: &str) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>(
            "SELECT * FROM songs WHERE artist = ? ORDER BY album, track_number ASC",
        )
        .bind(artist)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn by_album(&self, album: &str) -> Result<Vec<Song>> {
        let songs =
            query_as::<_, Song>("SELECT * FROM songs WHERE album = ? ORDER BY track_number ASC")
                .bind(album)
                .fetch_all(&self.pool)
                .await?;

        Ok(songs)
    }

    async fn by_genre(&self, genre: &str) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>("SELECT * FROM songs WHERE genre = ? ORDER BY title ASC")
            .bind(genre)
            .fetch_all(&self.pool)
            .await?;

        Ok(songs)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Song>> {
        // SQLite LIKE is case-insensitive for ASCII by default
        let songs = query_as::<_, Song>(
            r#"
            SELECT * FROM songs
            WHERE title LIKE '%' || ?1 || '%'
               OR artist LIKE '%' || ?1 || '%'
               OR album LIKE '%' || ?1 || '%'
            ORDER BY title ASC
            "#,
        )
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn favorites(&self) -> Result<Vec<Song>> {
        let songs =
            query_as::<_, Song>("SELECT * FROM songs WHERE is_favorite = 1 ORDER BY title ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(songs)
    }

    async fn recently_played(&self, limit: u32) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>(
            r#"
            SELECT * FROM songs
            WHERE last_played IS NOT NULL
            ORDER BY last_played DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn most_played(&self, limit: u32) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>(
            r#"
            SELECT * FROM songs
            WHERE play_count > 0
            ORDER BY play_count DESC, last_played DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn artists(&self) -> Result<Vec<String>> {
        let rows = query_as::<_, (String,)>(
            "SELECT DISTINCT artist FROM songs WHERE artist != '' ORDER BY artist ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn albums(&self) -> Result<Vec<String>> {
        let rows = query_as::<_, (String,)>(
            "SELECT DISTINCT album FROM songs WHERE album != '' ORDER BY album ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn genres(&self) -> Result<Vec<String>> {
        let rows = query_as::<_, (String,)>(
            "SELECT DISTINCT genre FROM songs WHERE genre IS NOT NULL AND genre != '' ORDER BY genre ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn set_favorite(&self, song_id: &str, is_favorite: bool) -> Result<bool> {
        let result = query("UPDATE songs SET is_favorite = ? WHERE id = ?")
            .bind(is_favorite)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_play(&self, song_id: &str) -> Result<bool> {
        let result =
            query("UPDATE songs SET last_played = ?, play_count = play_count + 1 WHERE id = ?")
                .bind(now_ms())
                .bind(song_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_download_state(
        &self,
        song_id: &str,
        is_downloaded: bool,
        local_path: Option<&str>,
    ) -> Result<bool> {
        let result = query("UPDATE songs SET is_downloaded = ?, local_path = ? WHERE id = ?")
            .bind(is_downloaded)
            .bind(local_path)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, song_id: &str) -> Result<bool> {
        let result = query("DELETE FROM songs WHERE id = ?")
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = query("DELETE FROM songs").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn total_duration_ms(&self) -> Result<i64> {
        let total: (i64,) = query_as("SELECT COALESCE(SUM(duration_ms), 0) FROM songs")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.0)
    }

    async fn total_file_size(&self) -> Result<i64> {
        let total: (i64,) = query_as("SELECT COALESCE(SUM(file_size), 0) FROM songs")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.0)
    }
}
