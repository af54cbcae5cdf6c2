//! Favorites screen state holder.

use mellow_library::{LibraryStore, Song};
use mellow_playback::PlaybackController;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::watch;

/// UI snapshot for the favorites screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FavoritesScreenState {
    pub is_loading: bool,
    pub favorite_songs: Vec<Song>,
    pub favorite_artists: Vec<String>,
    pub favorite_albums: Vec<String>,
    pub error: Option<String>,
}

/// State holder for the favorites screen.
pub struct FavoritesScreen {
    library: LibraryStore,
    playback: Arc<PlaybackController>,
    state: watch::Sender<FavoritesScreenState>,
}

impl FavoritesScreen {
    pub fn new(library: LibraryStore, playback: Arc<PlaybackController>) -> Self {
        let (state, _) = watch::channel(FavoritesScreenState::default());
        Self {
            library,
            playback,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FavoritesScreenState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut FavoritesScreenState)) {
        self.state.send_modify(f);
    }

    /// Reload favorite songs and the artist/album rollups derived from
    /// them.
    pub async fn refresh(&self) {
        self.update(|s| s.is_loading = true);

        match self.library.favorite_songs().await {
            Ok(songs) => {
                let mut artists: Vec<String> = songs
                    .iter()
                    .filter(|s| !s.artist.is_empty())
                    .map(|s| s.artist.clone())
                    .collect();
                artists.sort();
                artists.dedup();

                let mut albums: Vec<String> = songs
                    .iter()
                    .filter(|s| !s.album.is_empty())
                    .map(|s| s.album.clone())
                    .collect();
                albums.sort();
                albums.dedup();

                self.update(|s| {
                    s.is_loading = false;
                    s.favorite_songs = songs;
                    s.favorite_artists = artists;
                    s.favorite_albums = albums;
                    s.error = None;
                });
            }
            Err(e) => self.update(|s| {
                s.is_loading = false;
                s.error = Some(e.to_string());
            }),
        }
    }

    /// Drop a song from favorites.
    pub async fn remove_from_favorites(&self, song_id: &str) {
        match self.library.set_favorite(song_id, false).await {
            Ok(_) => self.refresh().await,
            Err(e) => self.update(|s| {
                s.error = Some(format!("Failed to remove from favorites: {}", e))
            }),
        }
    }

    /// Play one favorite in the context of the whole list.
    pub async fn play_song(&self, song_id: &str) {
        let queue = self.state.borrow().favorite_songs.clone();
        let Some(index) = queue.iter().position(|s| s.id == song_id) else {
            return;
        };

        if let Err(e) = self.playback.load_queue(queue, index).await {
            self.update(|s| s.error = Some(format!("Failed to play song: {}", e)));
        }
    }

    /// Play all favorites in a shuffled order.
    pub async fn shuffle_all(&self) {
        let mut queue = self.state.borrow().favorite_songs.clone();
        if queue.is_empty() {
            return;
        }

        queue.shuffle(&mut rand::thread_rng());
        if let Err(e) = self.playback.load_queue(queue, 0).await {
            self.update(|s| s.error = Some(format!("Failed to shuffle favorites: {}", e)));
        }
    }
}
