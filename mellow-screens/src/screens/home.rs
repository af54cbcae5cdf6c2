//! Home screen state holder.

use mellow_library::{LibraryStore, Playlist, Song};
use mellow_playback::PlaybackController;
use std::sync::Arc;
use tokio::sync::watch;

/// How many playlists the quick-access row shows.
const QUICK_ACCESS_LIMIT: usize = 6;

/// UI snapshot for the home screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeScreenState {
    pub is_loading: bool,
    pub recently_played: Vec<Song>,
    pub quick_access_playlists: Vec<Playlist>,
    pub total_songs: i64,
    pub total_artists: i64,
    pub total_albums: i64,
    pub error: Option<String>,
}

/// State holder for the home screen.
pub struct HomeScreen {
    library: LibraryStore,
    playback: Arc<PlaybackController>,
    recently_played_limit: u32,
    state: watch::Sender<HomeScreenState>,
}

impl HomeScreen {
    pub fn new(
        library: LibraryStore,
        playback: Arc<PlaybackController>,
        recently_played_limit: u32,
    ) -> Self {
        let (state, _) = watch::channel(HomeScreenState::default());
        Self {
            library,
            playback,
            recently_played_limit,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> HomeScreenState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut HomeScreenState)) {
        self.state.send_modify(f);
    }

    /// Reload everything the home screen shows.
    pub async fn refresh(&self) {
        self.update(|s| s.is_loading = true);

        let loaded = self.load().await;
        match loaded {
            Ok((recently_played, playlists, total_songs, total_artists, total_albums)) => {
                self.update(|s| {
                    s.is_loading = false;
                    s.recently_played = recently_played;
                    s.quick_access_playlists = playlists;
                    s.total_songs = total_songs;
                    s.total_artists = total_artists;
                    s.total_albums = total_albums;
                    s.error = None;
                })
            }
            Err(e) => self.update(|s| {
                s.is_loading = false;
                s.error = Some(e.to_string());
            }),
        }
    }

    async fn load(
        &self,
    ) -> mellow_library::Result<(Vec<Song>, Vec<Playlist>, i64, i64, i64)> {
        let recently_played = self
            .library
            .recently_played(self.recently_played_limit)
            .await?;
        let mut playlists = self.library.playlists().await?;
        playlists.truncate(QUICK_ACCESS_LIMIT);
        let total_songs = self.library.song_count().await?;
        let total_artists = self.library.artists().await?.len() as i64;
        let total_albums = self.library.albums().await?.len() as i64;

        Ok((
            recently_played,
            playlists,
            total_songs,
            total_artists,
            total_albums,
        ))
    }

    /// Start playing one song from the recently-played row.
    pub async fn play_song(&self, song: Song) {
        let queue = {
            let current = self.state.borrow();
            if current.recently_played.iter().any(|s| s.id == song.id) {
                current.recently_played.clone()
            } else {
                vec![song.clone()]
            }
        };
        let start_index = queue.iter().position(|s| s.id == song.id).unwrap_or(0);

        if let Err(e) = self.playback.load_queue(queue, start_index).await {
            self.update(|s| s.error = Some(format!("Failed to play song: {}", e)));
        }
    }
}
