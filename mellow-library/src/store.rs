//! The library store facade.
//!
//! [`LibraryStore`] is the single writer of persisted song/playlist state.
//! Every mutation goes through one of its transactional operations and emits
//! a [`LibraryEvent`] after the commit, which is what drives live queries.

use crate::db::{create_pool, DatabaseConfig};
use crate::error::{LibraryError, Result};
use crate::live::{spawn_live_query, LiveQuery};
use crate::models::{Playlist, PlaylistWithSongs, Song};
use crate::repositories::playlist::{PlaylistRepository, SqlitePlaylistRepository};
use crate::repositories::song::{SongRepository, SqliteSongRepository};
use mellow_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, info, instrument};

/// Durable, queryable storage of songs, playlists, and their membership.
///
/// Cheap to clone; clones share the same pool and event bus.
#[derive(Clone)]
pub struct LibraryStore {
    pool: SqlitePool,
    songs: SqliteSongRepository,
    playlists: SqlitePlaylistRepository,
    events: EventBus,
}

impl LibraryStore {
    /// Open the store, run migrations, and seed the system playlists.
    pub async fn open(config: DatabaseConfig, events: EventBus) -> Result<Self> {
        let pool = create_pool(config).await?;
        let store = Self::with_pool(pool, events);
        store.ensure_system_playlists().await?;
        Ok(store)
    }

    /// Wrap an existing pool (tests, shared setups).
    pub fn with_pool(pool: SqlitePool, events: EventBus) -> Self {
        Self {
            songs: SqliteSongRepository::new(pool.clone()),
            playlists: SqlitePlaylistRepository::new(pool.clone()),
            pool,
            events,
        }
    }

    /// The event bus mutations are announced on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn emit(&self, event: LibraryEvent) {
        // No subscribers is fine; live queries come and go.
        self.events.emit(CoreEvent::Library(event)).ok();
    }

    /// Insert the built-in playlists when absent. Existing rows, including
    /// their aggregates, are left untouched.
    pub async fn ensure_system_playlists(&self) -> Result<()> {
        for playlist in [
            Playlist::favorites(),
            Playlist::recently_played(),
            Playlist::most_played(),
        ] {
            if self.playlists.find_by_id(&playlist.id).await?.is_none() {
                info!(playlist_id = %playlist.id, "Seeding system playlist");
                self.playlists.insert(&playlist).await?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Songs
    // =========================================================================

    /// Insert or replace a song by identifier.
    pub async fn upsert_song(&self, song: &Song) -> Result<()> {
        self.songs.upsert(song).await?;
        self.emit(LibraryEvent::SongsUpserted { count: 1 });
        Ok(())
    }

    /// Insert or replace a batch of songs in one transaction.
    pub async fn upsert_songs(&self, songs: &[Song]) -> Result<u64> {
        if songs.is_empty() {
            return Ok(0);
        }
        let written = self.songs.upsert_many(songs).await?;
        self.emit(LibraryEvent::SongsUpserted { count: written });
        Ok(written)
    }

    pub async fn song(&self, id: &str) -> Result<Option<Song>> {
        self.songs.find_by_id(id).await
    }

    pub async fn all_songs(&self) -> Result<Vec<Song>> {
        self.songs.all().await
    }

    pub async fn songs_by_artist(&self, artist: &str) -> Result<Vec<Song>> {
        self.songs.by_artist(artist).await
    }

    pub async fn songs_by_album(&self, album: &str) -> Result<Vec<Song>> {
        self.songs.by_album(album).await
    }

    pub async fn songs_by_genre(&self, genre: &str) -> Result<Vec<Song>> {
        self.songs.by_genre(genre).await
    }

    pub async fn search_songs(&self, needle: &str) -> Result<Vec<Song>> {
        self.songs.search(needle).await
    }

    pub async fn favorite_songs(&self) -> Result<Vec<Song>> {
        self.songs.favorites().await
    }

    pub async fn recently_played(&self, limit: u32) -> Result<Vec<Song>> {
        self.songs.recently_played(limit).await
    }

    pub async fn most_played(&self, limit: u32) -> Result<Vec<Song>> {
        self.songs.most_played(limit).await
    }

    pub async fn artists(&self) -> Result<Vec<String>> {
        self.songs.artists().await
    }

    pub async fn albums(&self) -> Result<Vec<String>> {
        self.songs.albums().await
    }

    pub async fn genres(&self) -> Result<Vec<String>> {
        self.songs.genres().await
    }

    pub async fn song_count(&self) -> Result<i64> {
        self.songs.count().await
    }

    pub async fn total_duration_ms(&self) -> Result<i64> {
        self.songs.total_duration_ms().await
    }

    pub async fn total_file_size(&self) -> Result<i64> {
        self.songs.total_file_size().await
    }

    /// Flip the favorite flag. Returns `false` for an unknown song.
    #[instrument(skip(self))]
    pub async fn set_favorite(&self, song_id: &str, is_favorite: bool) -> Result<bool> {
        let updated = self.songs.set_favorite(song_id, is_favorite).await?;
        if updated {
            self.emit(LibraryEvent::FavoriteChanged {
                song_id: song_id.to_string(),
                is_favorite,
            });
        }
        Ok(updated)
    }

    /// Record a completed play start for a song.
    #[instrument(skip(self))]
    pub async fn record_play(&self, song_id: &str) -> Result<bool> {
        let updated = self.songs.record_play(song_id).await?;
        if updated {
            self.emit(LibraryEvent::PlayRecorded {
                song_id: song_id.to_string(),
            });
        }
        Ok(updated)
    }

    /// Update a song's local download state.
    pub async fn set_download_state(
        &self,
        song_id: &str,
        is_downloaded: bool,
        local_path: Option<&str>,
    ) -> Result<bool> {
        let updated = self
            .songs
            .set_download_state(song_id, is_downloaded, local_path)
            .await?;
        if updated {
            self.emit(LibraryEvent::DownloadStateChanged {
                song_id: song_id.to_string(),
                is_downloaded,
            });
        }
        Ok(updated)
    }

    /// Delete a song. Membership rows cascade, and the aggregates of every
    /// playlist the song belonged to are refreshed in the same transaction.
    #[instrument(skip(self))]
    pub async fn delete_song(&self, song_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let affected: Vec<(String,)> =
            query_as("SELECT playlist_id FROM playlist_song_cross_ref WHERE song_id = ?")
                .bind(song_id)
                .fetch_all(&mut *tx)
                .await?;

        let result = query("DELETE FROM songs WHERE id = ?")
            .bind(song_id)
            .execute(&mut *tx)
            .await?;

        for (playlist_id,) in &affected {
            SqlitePlaylistRepository::recompute_stats(&mut tx, playlist_id).await?;
        }

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!(song_id, playlists = affected.len(), "Deleted song");
            self.emit(LibraryEvent::SongDeleted {
                song_id: song_id.to_string(),
            });
            for (playlist_id,) in affected {
                self.emit(LibraryEvent::MembershipChanged { playlist_id });
            }
        }
        Ok(deleted)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Create a user playlist.
    pub async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Playlist> {
        let mut playlist = Playlist::new(name);
        playlist.description = description.map(str::to_string);
        self.playlists.insert(&playlist).await?;
        self.emit(LibraryEvent::PlaylistCreated {
            playlist_id: playlist.id.clone(),
            name: playlist.name.clone(),
        });
        Ok(playlist)
    }

    /// Update a playlist's metadata (name, description, cover art).
    pub async fn update_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.playlists.update(playlist).await?;
        self.emit(LibraryEvent::PlaylistUpdated {
            playlist_id: playlist.id.clone(),
        });
        Ok(())
    }

    /// Delete a user playlist and its membership.
    ///
    /// # Errors
    ///
    /// `LibraryError::SystemPlaylistProtected` for the built-in playlists.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<bool> {
        if let Some(playlist) = self.playlists.find_by_id(playlist_id).await? {
            if playlist.is_system {
                return Err(LibraryError::SystemPlaylistProtected {
                    id: playlist_id.to_string(),
                });
            }
        } else {
            return Ok(false);
        }

        let deleted = self.playlists.delete(playlist_id).await?;
        if deleted {
            self.emit(LibraryEvent::PlaylistDeleted {
                playlist_id: playlist_id.to_string(),
            });
        }
        Ok(deleted)
    }

    pub async fn playlist(&self, id: &str) -> Result<Option<Playlist>> {
        self.playlists.find_by_id(id).await
    }

    pub async fn playlists(&self) -> Result<Vec<Playlist>> {
        self.playlists.all().await
    }

    pub async fn search_playlists(&self, needle: &str) -> Result<Vec<Playlist>> {
        self.playlists.search(needle).await
    }

    pub async fn playlist_with_songs(&self, id: &str) -> Result<Option<PlaylistWithSongs>> {
        self.playlists.with_songs(id).await
    }

    pub async fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<Song>> {
        self.playlists.songs_of(playlist_id).await
    }

    /// Append a song to a playlist and refresh its aggregates atomically.
    #[instrument(skip(self))]
    pub async fn add_song_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<()> {
        self.playlists.add_song(playlist_id, song_id).await?;
        self.emit(LibraryEvent::MembershipChanged {
            playlist_id: playlist_id.to_string(),
        });
        Ok(())
    }

    /// Remove a song from a playlist and refresh its aggregates atomically.
    #[instrument(skip(self))]
    pub async fn remove_song_from_playlist(
        &self,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<bool> {
        let removed = self.playlists.remove_song(playlist_id, song_id).await?;
        if removed {
            self.emit(LibraryEvent::MembershipChanged {
                playlist_id: playlist_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Remove every song from a playlist (used before a full rebuild).
    pub async fn clear_playlist(&self, playlist_id: &str) -> Result<u64> {
        let removed = self.playlists.remove_all_songs(playlist_id).await?;
        if removed > 0 {
            self.emit(LibraryEvent::MembershipChanged {
                playlist_id: playlist_id.to_string(),
            });
        }
        Ok(removed)
    }

    // =========================================================================
    // Live queries
    // =========================================================================

    /// Live view over all songs, title ascending.
    pub async fn watch_all_songs(&self) -> Result<LiveQuery<Vec<Song>>> {
        let store = self.clone();
        spawn_live_query(&self.events, move || {
            let store = store.clone();
            async move { store.all_songs().await }
        })
        .await
    }

    /// Live view over favorite songs.
    pub async fn watch_favorites(&self) -> Result<LiveQuery<Vec<Song>>> {
        let store = self.clone();
        spawn_live_query(&self.events, move || {
            let store = store.clone();
            async move { store.favorite_songs().await }
        })
        .await
    }

    /// Live view over recently played songs.
    pub async fn watch_recently_played(&self, limit: u32) -> Result<LiveQuery<Vec<Song>>> {
        let store = self.clone();
        spawn_live_query(&self.events, move || {
            let store = store.clone();
            async move { store.recently_played(limit).await }
        })
        .await
    }

    /// Live view over all playlists.
    pub async fn watch_playlists(&self) -> Result<LiveQuery<Vec<Playlist>>> {
        let store = self.clone();
        spawn_live_query(&self.events, move || {
            let store = store.clone();
            async move { store.playlists().await }
        })
        .await
    }

    /// Live view over one playlist's member songs.
    pub async fn watch_playlist_songs(
        &self,
        playlist_id: impl Into<String>,
    ) -> Result<LiveQuery<Vec<Song>>> {
        let store = self.clone();
        let playlist_id = playlist_id.into();
        spawn_live_query(&self.events, move || {
            let store = store.clone();
            let playlist_id = playlist_id.clone();
            async move { store.playlist_songs(&playlist_id).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn store() -> LibraryStore {
        let pool = create_test_pool().await.unwrap();
        let store = LibraryStore::with_pool(pool, EventBus::new(64));
        store.ensure_system_playlists().await.unwrap();
        store
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
    async fn test_system_playlists_seeded_once() {
        let store = store().await;

        let playlists = store.playlists().await.unwrap();
        assert_eq!(playlists.len(), 3);

        // Re-seeding must not duplicate or reset anything
        store.ensure_system_playlists().await.unwrap();
        assert_eq!(store.playlists().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_system_playlist_delete_refused() {
        let store = store().await;

        let result = store.delete_playlist(Playlist::FAVORITES_ID).await;
        assert!(matches!(
            result,
            Err(LibraryError::SystemPlaylistProtected { .. })
        ));
        assert!(store
            .playlist(Playlist::FAVORITES_ID)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_playlist_is_false() {
        let store = store().await;
        assert!(!store.delete_playlist("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_song_refreshes_playlist_aggregates() {
        let store = store().await;

        let playlist = store.create_playlist("Mix", None).await.unwrap();
        store.upsert_song(&song("s1", 1000)).await.unwrap();
        store.upsert_song(&song("s2", 2000)).await.unwrap();
        store.add_song_to_playlist(&playlist.id, "s1").await.unwrap();
        store.add_song_to_playlist(&playlist.id, "s2").await.unwrap();

        store.delete_song("s1").await.unwrap();

        let found = store.playlist(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 1);
        assert_eq!(found.duration_ms, 2000);
    }

    #[tokio::test]
    async fn test_upsert_idempotence_keeps_playlist_aggregates() {
        let store = store().await;

        let playlist = store.create_playlist("Mix", None).await.unwrap();
        let s = song("s1", 1500);
        store.upsert_song(&s).await.unwrap();
        store.add_song_to_playlist(&playlist.id, "s1").await.unwrap();

        // Upserting identical data twice leaves one row and one membership
        store.upsert_song(&s).await.unwrap();

        assert_eq!(store.song_count().await.unwrap(), 1);
        let found = store.playlist(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 1);
        assert_eq!(found.duration_ms, 1500);
    }

    #[tokio::test]
    async fn test_mutations_emit_library_events() {
        let store = store().await;
        let mut rx = store.events().subscribe();

        store.upsert_song(&song("s1", 1000)).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            CoreEvent::Library(LibraryEvent::SongsUpserted { count: 1 })
        );

        store.set_favorite("s1", true).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            CoreEvent::Library(LibraryEvent::FavoriteChanged {
                song_id: "s1".to_string(),
                is_favorite: true,
            })
        );
    }

    #[tokio::test]
    async fn test_no_event_for_missing_song_mutation() {
        let store = store().await;
        let mut rx = store.events().subscribe();

        assert!(!store.set_favorite("ghost", true).await.unwrap());
        assert!(!store.record_play("ghost").await.unwrap());

        // Nothing was committed, so nothing was announced
        use tokio::sync::broadcast::error::TryRecvError;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_watch_favorites_updates_on_toggle() {
        let store = store().await;
        store.upsert_song(&song("s1", 1000)).await.unwrap();

        let live = store.watch_favorites().await.unwrap();
        assert!(live.snapshot().is_empty());

        let mut rx = live.subscribe();
        store.set_favorite("s1", true).await.unwrap();

        rx.changed().await.unwrap();
        let favorites = rx.borrow().clone();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, "s1");
    }

    #[tokio::test]
    async fn test_watch_playlist_songs_follows_membership() {
        let store = store().await;
        let playlist = store.create_playlist("Mix", None).await.unwrap();
        store.upsert_song(&song("s1", 1000)).await.unwrap();

        let live = store.watch_playlist_songs(playlist.id.clone()).await.unwrap();
        let mut rx = live.subscribe();
        assert!(rx.borrow().is_empty());

        store.add_song_to_playlist(&playlist.id, "s1").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);

        store
            .remove_song_from_playlist(&playlist.id, "s1")
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_clear_playlist() {
        let store = store().await;
        let playlist = store.create_playlist("Mix", None).await.unwrap();
        for id in ["s1", "s2", "s3"] {
            store.upsert_song(&song(id, 1000)).await.unwrap();
            store.add_song_to_playlist(&playlist.id, id).await.unwrap();
        }

        assert_eq!(store.clear_playlist(&playlist.id).await.unwrap(), 3);
        let found = store.playlist(&playlist.id).await.unwrap().unwrap();
        assert_eq!(found.song_count, 0);
        assert_eq!(found.duration_ms, 0);
    }
}
