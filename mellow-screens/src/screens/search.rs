//! Search screen state holder.

use mellow_library::{LibraryStore, Playlist, Song};
use tokio::sync::watch;

/// UI snapshot for the search screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchScreenState {
    pub query: String,
    pub is_searching: bool,
    pub songs: Vec<Song>,
    pub playlists: Vec<Playlist>,
    pub error: Option<String>,
}

/// State holder for the search screen.
pub struct SearchScreen {
    library: LibraryStore,
    state: watch::Sender<SearchScreenState>,
}

impl SearchScreen {
    pub fn new(library: LibraryStore) -> Self {
        let (state, _) = watch::channel(SearchScreenState::default());
        Self { library, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchScreenState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut SearchScreenState)) {
        self.state.send_modify(f);
    }

    /// Run a free-text search across songs and playlists.
    ///
    /// A blank query clears the results instead of matching everything.
    pub async fn search(&self, query: &str) {
        let trimmed = query.trim().to_string();
        if trimmed.is_empty() {
            self.clear();
            return;
        }

        self.update(|s| {
            s.query = trimmed.clone();
            s.is_searching = true;
            s.error = None;
        });

        let songs = self.library.search_songs(&trimmed).await;
        let playlists = self.library.search_playlists(&trimmed).await;

        match (songs, playlists) {
            (Ok(songs), Ok(playlists)) => self.update(|s| {
                s.is_searching = false;
                s.songs = songs;
                s.playlists = playlists;
            }),
            (Err(e), _) | (_, Err(e)) => self.update(|s| {
                s.is_searching = false;
                s.error = Some(e.to_string());
            }),
        }
    }

    /// Clear the query and results.
    pub fn clear(&self) {
        self.update(|s| {
            s.query.clear();
            s.songs.clear();
            s.playlists.clear();
            s.is_searching = false;
            s.error = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_library::db::create_test_pool;
    use mellow_runtime::events::EventBus;

    async fn fixture() -> (SearchScreen, LibraryStore) {
        let store = LibraryStore::with_pool(create_test_pool().await.unwrap(), EventBus::new(64));
        (SearchScreen::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_search_hits_songs_and_playlists() {
        let (screen, store) = fixture().await;

        store
            .upsert_song(&Song::new(
                "s1",
                "Moonlight Serenade",
                "Night Jazz Collective",
                "After Midnight",
                1000,
                "d1",
                "audio/mpeg",
            ))
            .await
            .unwrap();
        store
            .create_playlist("Midnight Drive", None)
            .await
            .unwrap();

        screen.search("midnight").await;

        let state = screen.state();
        assert!(!state.is_searching);
        assert_eq!(state.songs.len(), 1, "matched on album");
        assert_eq!(state.playlists.len(), 1, "matched on playlist name");
        assert_eq!(state.query, "midnight");
    }

    #[tokio::test]
    async fn test_no_hits_is_empty_not_error() {
        let (screen, _) = fixture().await;

        screen.search("nothing").await;

        let state = screen.state();
        assert!(state.songs.is_empty());
        assert!(state.playlists.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_blank_query_clears() {
        let (screen, store) = fixture().await;
        store
            .upsert_song(&Song::new(
                "s1", "Title", "Artist", "Album", 1000, "d1", "audio/mpeg",
            ))
            .await
            .unwrap();

        screen.search("title").await;
        assert_eq!(screen.state().songs.len(), 1);

        screen.search("   ").await;
        let state = screen.state();
        assert!(state.songs.is_empty());
        assert!(state.query.is_empty());
    }
}
