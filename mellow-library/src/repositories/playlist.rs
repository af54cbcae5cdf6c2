//! Playlist repository trait and implementation
//!
//! Membership mutations and the denormalized aggregate recompute always run
//! inside one transaction, so readers never observe a playlist whose
//! `song_count`/`duration_ms` disagree with its membership rows.

use crate::error::{LibraryError, Result};
use crate::models::{now_ms, Playlist, PlaylistSongEntry, PlaylistWithSongs, Song};
use async_trait::async_trait;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};

/// Playlist repository interface for data access operations
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Find a playlist by its ID. `Ok(None)` when absent.
    async fn find_by_id(&self, id: &str) -> Result<Option<Playlist>>;

    /// All playlists, name ascending.
    async fn all(&self) -> Result<Vec<Playlist>>;

    /// Case-insensitive substring search over playlist names.
    async fn search(&self, needle: &str) -> Result<Vec<Playlist>>;

    /// Insert a playlist; replaces an existing row with the same ID.
    async fn insert(&self, playlist: &Playlist) -> Result<()>;

    /// Update an existing playlist's metadata.
    ///
    /// # Errors
    /// `LibraryError::NotFound` when the playlist doesn't exist.
    async fn update(&self, playlist: &Playlist) -> Result<()>;

    /// Delete a playlist. Membership rows cascade. Returns `false` when the
    /// playlist was not found.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Add a song at `max(position) + 1` and refresh the playlist
    /// aggregates, all in one transaction. Re-adding an existing member
    /// replaces its row (new position and timestamp, still one membership).
    async fn add_song(&self, playlist_id: &str, song_id: &str) -> Result<()>;

    /// Remove one song and refresh the aggregates in one transaction.
    /// Returns `false` when the song was not a member.
    async fn remove_song(&self, playlist_id: &str, song_id: &str) -> Result<bool>;

    /// Remove every member and refresh the aggregates in one transaction.
    /// Returns the number of membership rows removed.
    async fn remove_all_songs(&self, playlist_id: &str) -> Result<u64>;

    /// Member song IDs in position order.
    async fn song_ids(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Member songs in position order.
    async fn songs_of(&self, playlist_id: &str) -> Result<Vec<Song>>;

    /// Membership rows for a playlist, position order.
    async fn entries(&self, playlist_id: &str) -> Result<Vec<PlaylistSongEntry>>;

    /// Playlist plus its member songs. `Ok(None)` when the playlist is
    /// absent.
    async fn with_songs(&self, id: &str) -> Result<Option<PlaylistWithSongs>>;

    /// Highest membership position, or `None` for an empty playlist.
    async fn max_position(&self, playlist_id: &str) -> Result<Option<i64>>;

    /// Count total playlists.
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of PlaylistRepository
#[derive(Clone)]
pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
}

impl SqlitePlaylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validated(playlist: &Playlist) -> Result<()> {
        playlist.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Playlist".to_string(),
            message: e,
        })
    }

    /// Recompute `song_count`/`duration_ms` from membership, inside the
    /// caller's transaction. Missing member songs contribute 0 duration.
    pub(crate) async fn recompute_stats(
        tx: &mut Transaction<'_, Sqlite>,
        playlist_id: &str,
    ) -> Result<()> {
        query(
            r#"
            UPDATE playlists
            SET song_count = (
                SELECT COUNT(*)
                FROM playlist_song_cross_ref
                WHERE playlist_id = ?1
            ),
            duration_ms = (
                SELECT COALESCE(SUM(songs.duration_ms), 0)
                FROM playlist_song_cross_ref
                JOIN songs ON playlist_song_cross_ref.song_id = songs.id
                WHERE playlist_song_cross_ref.playlist_id = ?1
            ),
            date_modified = ?2
            WHERE id = ?1
            "#,
        )
        .bind(playlist_id)
        .bind(now_ms())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PlaylistRepository for SqlitePlaylistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Playlist>> {
        let playlist = query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    async fn all(&self) -> Result<Vec<Playlist>> {
        let playlists = query_as::<_, Playlist>("SELECT * FROM playlists ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(playlists)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Playlist>> {
        let playlists = query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE name LIKE '%' || ? || '%' ORDER BY name ASC",
        )
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        Ok(playlists)
    }

    async fn insert(&self, playlist: &Playlist) -> Result<()> {
        Self::validated(playlist)?;

        query(
            r#"
            INSERT OR REPLACE INTO playlists (
                id, name, description, cover_art_url, song_count, duration_ms,
                date_created, date_modified, is_system
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.cover_art_url)
        .bind(playlist.song_count)
        .bind(playlist.duration_ms)
        .bind(playlist.date_created)
        .bind(playlist.date_modified)
        .bind(playlist.is_system)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, playlist: &Playlist) -> Result<()> {
        Self::validated(playlist)?;

        let result = query(
            r#"
            UPDATE playlists
            SET name = ?, description = ?, cover_art_url = ?, date_modified = ?
            WHERE id = ?
            "#,
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.cover_art_url)
        .bind(now_ms())
        .bind(&playlist.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Playlist".to_string(),
                id: playlist.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_song(&self, playlist_id: &str, song_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let max: (i64,) = query_as(
            "SELECT COALESCE(MAX(position), -1) FROM playlist_song_cross_ref WHERE playlist_id = ?",
        )
        .bind(playlist_id)
        .fetch_one(&mut *tx)
        .await?;

        query(
            r#"
            INSERT OR REPLACE INTO playlist_song_cross_ref
                (playlist_id, song_id, added_at, position)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(playlist_id)
        .bind(song_id)
        .bind(now_ms())
        .bind(max.0 + 1)
        .execute(&mut *tx)
        .await?;

        Self::recompute_stats(&mut tx, playlist_id).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn remove_song(&self, playlist_id: &str, song_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result =
            query("DELETE FROM playlist_song_cross_ref WHERE playlist_id = ? AND song_id = ?")
                .bind(playlist_id)
                .bind(song_id)
                .execute(&mut *tx)
                .await?;

        Self::recompute_stats(&mut tx, playlist_id).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_all_songs(&self, playlist_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let result = query("DELETE FROM playlist_song_cross_ref WHERE playlist_id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        Self::recompute_stats(&mut tx, playlist_id).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn song_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let rows = query_as::<_, (String,)>(
            "SELECT song_id FROM playlist_song_cross_ref WHERE playlist_id = ? ORDER BY position ASC",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn songs_of(&self, playlist_id: &str) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>(
            r#"
            SELECT songs.* FROM songs
            JOIN playlist_song_cross_ref ON playlist_song_cross_ref.song_id = songs.id
            WHERE playlist_song_cross_ref.playlist_id = ?
            ORDER BY playlist_song_cross_ref.position ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn entries(&self, playlist_id: &str) -> Result<Vec<PlaylistSongEntry>> {
        let entries = query_as::<_, PlaylistSongEntry>(
            "SELECT * FROM playlist_song_cross_ref WHERE playlist_id = ? ORDER BY position ASC",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn with_songs(&self, id: &str) -> Result<Option<PlaylistWithSongs>> {
        let Some(playlist) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let songs = self.songs_of(id).await?;
        Ok(Some(PlaylistWithSongs { playlist, songs }))
    }

    async fn max_position(&self, playlist_id: &str) -> Result<Option<i64>> {
        let max: (Option<i64>,) =
            query_as("SELECT MAX(position) FROM playlist_song_cross_ref WHERE playlist_id = ?")
                .bind(playlist_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(max.0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM playlists")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::song::{SongRepository, SqliteSongRepository};

    async fn repos() -> (SqlitePlaylistRepository, SqliteSongRepository) {
        let pool = create_test_pool().await.unwrap();
        (
            SqlitePlaylistRepository::new(pool.clone()),
            SqliteSongRepository::new(pool),
        )
    }

    fn song(id: &str, duration_ms: i64) -> Song {
        Song::new(
            id,
            format!("Title {}", id),
            "Artist",
            "Album",
            duration_ms,
            format!("drive-{}", id),
            "audio/mpeg",
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_playlist() {
        let (playlists, _) = repos().await;

        let mut playlist = Playlist::new("My Playlist");
        playlist.description = Some("Workout mix".to_string());
        playlists.insert(&playlist).await.unwrap();

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.name, "My Playlist");
        assert_eq!(found.description.as_deref(), Some("Workout mix"));
        assert!(!found.is_system);
    }

    #[tokio::test]
    async fn test_update_playlist() {
        let (playlists, _) = repos().await;

        let mut playlist = Playlist::new("Original Name");
        playlists.insert(&playlist).await.unwrap();

        playlist.name = "Updated Name".to_string();
        playlists.update(&playlist).await.unwrap();

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Updated Name");
    }

    #[tokio::test]
    async fn test_update_missing_playlist_is_not_found() {
        let (playlists, _) = repos().await;

        let playlist = Playlist::new("Ghost");
        let result = playlists.update(&playlist).await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_song_appends_position_and_updates_stats() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();
        songs.upsert(&song("s2", 2500)).await.unwrap();

        playlists.add_song(&playlist.id, "s1").await.unwrap();
        playlists.add_song(&playlist.id, "s2").await.unwrap();

        let entries = playlists.entries(&playlist.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].position, 0);
        assert_eq!(entries[1].position, 1);

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 2);
        assert_eq!(found.duration_ms, 3500);
    }

    #[tokio::test]
    async fn test_add_song_twice_is_idempotent_membership() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();

        playlists.add_song(&playlist.id, "s1").await.unwrap();
        playlists.add_song(&playlist.id, "s1").await.unwrap();

        // Second add replaces the row rather than duplicating it
        let entries = playlists.entries(&playlist.id).await.unwrap();
        assert_eq!(entries.len(), 1);

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 1);
        assert_eq!(found.duration_ms, 1000);
    }

    #[tokio::test]
    async fn test_remove_song_updates_stats() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();
        songs.upsert(&song("s2", 2000)).await.unwrap();
        playlists.add_song(&playlist.id, "s1").await.unwrap();
        playlists.add_song(&playlist.id, "s2").await.unwrap();

        let removed = playlists.remove_song(&playlist.id, "s1").await.unwrap();
        assert!(removed);

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 1);
        assert_eq!(found.duration_ms, 2000);

        // Removing a non-member is Ok(false), not an error
        let removed = playlists.remove_song(&playlist.id, "ghost").await.unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_max_position_reflects_membership() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        assert_eq!(playlists.max_position(&playlist.id).await.unwrap(), None);

        for id in ["s1", "s2", "s3"] {
            songs.upsert(&song(id, 1000)).await.unwrap();
            playlists.add_song(&playlist.id, id).await.unwrap();
        }
        assert_eq!(playlists.max_position(&playlist.id).await.unwrap(), Some(2));

        playlists.remove_song(&playlist.id, "s3").await.unwrap();
        assert_eq!(playlists.max_position(&playlist.id).await.unwrap(), Some(1));

        // Next append lands after the current maximum
        songs.upsert(&song("s4", 1000)).await.unwrap();
        playlists.add_song(&playlist.id, "s4").await.unwrap();
        let entries = playlists.entries(&playlist.id).await.unwrap();
        assert_eq!(entries.last().unwrap().position, 2);
    }

    #[tokio::test]
    async fn test_remove_all_songs() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        for id in ["s1", "s2"] {
            songs.upsert(&song(id, 1000)).await.unwrap();
            playlists.add_song(&playlist.id, id).await.unwrap();
        }

        let removed = playlists.remove_all_songs(&playlist.id).await.unwrap();
        assert_eq!(removed, 2);

        let found = playlists.find_by_id(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 0);
        assert_eq!(found.duration_ms, 0);
    }

    #[tokio::test]
    async fn test_songs_of_position_order() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Ordered");
        playlists.insert(&playlist).await.unwrap();
        for id in ["s3", "s1", "s2"] {
            songs.upsert(&song(id, 1000)).await.unwrap();
            playlists.add_song(&playlist.id, id).await.unwrap();
        }

        let members = playlists.songs_of(&playlist.id).await.unwrap();
        let ids: Vec<_> = members.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s1", "s2"], "insertion order preserved");
    }

    #[tokio::test]
    async fn test_delete_cascades_membership() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Doomed");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();
        playlists.add_song(&playlist.id, "s1").await.unwrap();

        assert!(playlists.delete(&playlist.id).await.unwrap());
        assert!(playlists.entries(&playlist.id).await.unwrap().is_empty());

        // Song itself survives
        assert!(songs.find_by_id("s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_song_delete_cascades_membership() {
        let (playlists, songs) = repos().await;

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();
        playlists.add_song(&playlist.id, "s1").await.unwrap();

        songs.delete_by_id("s1").await.unwrap();
        assert!(playlists.entries(&playlist.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_songs() {
        let (playlists, songs) = repos().await;

        assert!(playlists.with_songs("ghost").await.unwrap().is_none());

        let playlist = Playlist::new("Mix");
        playlists.insert(&playlist).await.unwrap();
        songs.upsert(&song("s1", 1000)).await.unwrap();
        playlists.add_song(&playlist.id, "s1").await.unwrap();

        let combined = playlists.with_songs(&playlist.id).await.unwrap().unwrap();
        assert_eq!(combined.playlist.id, playlist.id);
        assert_eq!(combined.songs.len(), 1);
    }

    #[tokio::test]
    async fn test_search_playlists() {
        let (playlists, _) = repos().await;

        playlists.insert(&Playlist::new("Road Trip Anthems")).await.unwrap();
        playlists.insert(&Playlist::new("Chill Mix")).await.unwrap();

        let hits = playlists.search("trip").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Road Trip Anthems");
    }
}
