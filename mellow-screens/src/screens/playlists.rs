//! Playlist browser and detail state holder.

use mellow_library::{LibraryStore, Playlist, PlaylistWithSongs};
use mellow_playback::PlaybackController;
use std::sync::Arc;
use tokio::sync::watch;

/// UI snapshot for playlist browsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaylistsScreenState {
    pub is_loading: bool,
    pub playlists: Vec<Playlist>,
    /// The playlist currently opened in the detail view
    pub selected: Option<PlaylistWithSongs>,
    pub error: Option<String>,
}

/// State holder for the playlists screen and its detail view.
pub struct PlaylistsScreen {
    library: LibraryStore,
    playback: Arc<PlaybackController>,
    state: watch::Sender<PlaylistsScreenState>,
}

impl PlaylistsScreen {
    pub fn new(library: LibraryStore, playback: Arc<PlaybackController>) -> Self {
        let (state, _) = watch::channel(PlaylistsScreenState::default());
        Self {
            library,
            playback,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaylistsScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PlaylistsScreenState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut PlaylistsScreenState)) {
        self.state.send_modify(f);
    }

    fn capture_error(&self, context: &str, e: impl std::fmt::Display) {
        self.update(|s| {
            s.is_loading = false;
            s.error = Some(format!("{}: {}", context, e));
        });
    }

    /// Reload the playlist list (and the open detail view, if any).
    pub async fn refresh(&self) {
        self.update(|s| s.is_loading = true);

        match self.library.playlists().await {
            Ok(playlists) => self.update(|s| {
                s.is_loading = false;
                s.playlists = playlists;
                s.error = None;
            }),
            Err(e) => self.capture_error("Failed to load playlists", e),
        }

        let selected_id = self
            .state
            .borrow()
            .selected
            .as_ref()
            .map(|p| p.playlist.id.clone());
        if let Some(id) = selected_id {
            self.open(&id).await;
        }
    }

    /// Open one playlist's detail view.
    pub async fn open(&self, playlist_id: &str) {
        match self.library.playlist_with_songs(playlist_id).await {
            Ok(selected) => self.update(|s| {
                s.selected = selected;
                s.error = None;
            }),
            Err(e) => self.capture_error("Failed to open playlist", e),
        }
    }

    /// Close the detail view.
    pub fn close_detail(&self) {
        self.update(|s| s.selected = None);
    }

    pub async fn create(&self, name: &str, description: Option<&str>) {
        match self.library.create_playlist(name, description).await {
            Ok(_) => self.refresh().await,
            Err(e) => self.capture_error("Failed to create playlist", e),
        }
    }

    pub async fn delete(&self, playlist_id: &str) {
        match self.library.delete_playlist(playlist_id).await {
            Ok(_) => {
                self.update(|s| {
                    if s.selected.as_ref().map(|p| p.playlist.id.as_str()) == Some(playlist_id) {
                        s.selected = None;
                    }
                });
                self.refresh().await;
            }
            Err(e) => self.capture_error("Failed to delete playlist", e),
        }
    }

    pub async fn add_song(&self, playlist_id: &str, song_id: &str) {
        match self.library.add_song_to_playlist(playlist_id, song_id).await {
            Ok(()) => self.refresh().await,
            Err(e) => self.capture_error("Failed to add song", e),
        }
    }

    pub async fn remove_song(&self, playlist_id: &str, song_id: &str) {
        match self
            .library
            .remove_song_from_playlist(playlist_id, song_id)
            .await
        {
            Ok(_) => self.refresh().await,
            Err(e) => self.capture_error("Failed to remove song", e),
        }
    }

    /// Play a playlist from `start_index`.
    pub async fn play(&self, playlist_id: &str, start_index: usize) {
        let songs = match self.library.playlist_songs(playlist_id).await {
            Ok(songs) => songs,
            Err(e) => {
                self.capture_error("Failed to play playlist", e);
                return;
            }
        };

        if songs.is_empty() {
            return;
        }

        if let Err(e) = self.playback.load_queue(songs, start_index).await {
            self.capture_error("Failed to play playlist", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_library::db::create_test_pool;
    use mellow_library::Song;
    use mellow_playback::NullPlayerEngine;
    use mellow_runtime::events::EventBus;

    async fn fixture() -> (PlaylistsScreen, LibraryStore) {
        let store = LibraryStore::with_pool(create_test_pool().await.unwrap(), EventBus::new(64));
        store.ensure_system_playlists().await.unwrap();
        let playback = PlaybackController::new(Arc::new(NullPlayerEngine::new()));
        (PlaylistsScreen::new(store.clone(), playback), store)
    }

    fn song(id: &str) -> Song {
        Song::new(id, format!("Title {}", id), "Artist", "Album", 1000, id, "audio/mpeg")
    }

    #[tokio::test]
    async fn test_create_and_open() {
        let (screen, _) = fixture().await;

        screen.create("Road Trip", Some("Long drives")).await;

        let state = screen.state();
        assert_eq!(state.playlists.len(), 4, "three system + one user");
        let created = state
            .playlists
            .iter()
            .find(|p| p.name == "Road Trip")
            .unwrap();

        screen.open(&created.id).await;
        let state = screen.state();
        let selected = state.selected.unwrap();
        assert_eq!(selected.playlist.name, "Road Trip");
        assert!(selected.songs.is_empty());
    }

    #[tokio::test]
    async fn test_membership_flow_updates_detail() {
        let (screen, store) = fixture().await;
        store.upsert_song(&song("s1")).await.unwrap();

        screen.create("Mix", None).await;
        let playlist_id = screen
            .state()
            .playlists
            .iter()
            .find(|p| p.name == "Mix")
            .unwrap()
            .id
            .clone();
        screen.open(&playlist_id).await;

        screen.add_song(&playlist_id, "s1").await;
        let selected = screen.state().selected.unwrap();
        assert_eq!(selected.songs.len(), 1);
        assert_eq!(selected.playlist.song_count, 1);

        screen.remove_song(&playlist_id, "s1").await;
        let selected = screen.state().selected.unwrap();
        assert!(selected.songs.is_empty());
        assert_eq!(selected.playlist.song_count, 0);
    }

    #[tokio::test]
    async fn test_system_playlist_delete_shows_error() {
        let (screen, _) = fixture().await;
        screen.refresh().await;

        screen.delete(Playlist::FAVORITES_ID).await;

        let state = screen.state();
        assert!(state.error.as_deref().unwrap().contains("Failed to delete"));
        assert!(state
            .playlists
            .iter()
            .any(|p| p.id == Playlist::FAVORITES_ID));
    }

    #[tokio::test]
    async fn test_play_playlist() {
        let (screen, store) = fixture().await;
        screen.create("Mix", None).await;
        let playlist_id = screen
            .state()
            .playlists
            .iter()
            .find(|p| p.name == "Mix")
            .unwrap()
            .id
            .clone();

        for id in ["s1", "s2"] {
            store.upsert_song(&song(id)).await.unwrap();
            store.add_song_to_playlist(&playlist_id, id).await.unwrap();
        }

        screen.play(&playlist_id, 1).await;

        let playback = screen.playback.state();
        assert_eq!(playback.queue.len(), 2);
        assert_eq!(playback.current_song.unwrap().id, "s2");
    }

    #[tokio::test]
    async fn test_open_missing_playlist_is_absent_not_error() {
        let (screen, _) = fixture().await;
        screen.open("ghost").await;

        let state = screen.state();
        assert!(state.selected.is_none());
        assert!(state.error.is_none());
    }
}
