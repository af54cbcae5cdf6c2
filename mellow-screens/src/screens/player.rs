//! Now-playing screen state holder.
//!
//! Projects the playback state machine for display and forwards transport
//! intents. Also the place where "a play happened" becomes durable: each
//! time a new song starts playing, its play stats are recorded in the
//! library.

use mellow_library::{LibraryStore, Song};
use mellow_playback::{PlaybackController, PlaybackState, PlayerState, RepeatMode, ShuffleMode};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// UI snapshot for the now-playing screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerScreenState {
    pub playback: PlaybackState,
    pub error: Option<String>,
}

impl PlayerScreenState {
    pub fn current_song(&self) -> Option<&Song> {
        self.playback.current_song.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.player_state == PlayerState::Playing
    }
}

/// State holder for the now-playing screen.
pub struct PlayerScreen {
    playback: Arc<PlaybackController>,
    state: Arc<watch::Sender<PlayerScreenState>>,
    observer: JoinHandle<()>,
}

impl PlayerScreen {
    pub fn new(playback: Arc<PlaybackController>, library: LibraryStore) -> Self {
        let (state, _) = watch::channel(PlayerScreenState {
            playback: playback.state(),
            error: None,
        });
        let state = Arc::new(state);

        let observer = Self::spawn_observer(playback.clone(), library, Arc::clone(&state));

        Self {
            playback,
            state,
            observer,
        }
    }

    /// Mirror controller snapshots into the UI state and record play stats
    /// whenever a new song starts playing.
    fn spawn_observer(
        playback: Arc<PlaybackController>,
        library: LibraryStore,
        state: Arc<watch::Sender<PlayerScreenState>>,
    ) -> JoinHandle<()> {
        let mut rx = playback.subscribe();

        tokio::spawn(async move {
            let mut last_recorded: Option<String> = None;

            loop {
                if rx.changed().await.is_err() {
                    break;
                }

                let snapshot = rx.borrow().clone();

                if snapshot.player_state == PlayerState::Playing {
                    if let Some(song) = &snapshot.current_song {
                        if last_recorded.as_deref() != Some(song.id.as_str()) {
                            last_recorded = Some(song.id.clone());
                            if let Err(e) = library.record_play(&song.id).await {
                                warn!(error = %e, song_id = %song.id, "Failed to record play");
                            }
                        }
                    }
                }

                state.send_modify(|s| s.playback = snapshot);
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PlayerScreenState {
        self.state.borrow().clone()
    }

    fn capture(&self, result: mellow_playback::Result<()>) {
        if let Err(e) = result {
            self.state.send_modify(|s| s.error = Some(e.to_string()));
        }
    }

    // =========================================================================
    // Intents
    // =========================================================================

    pub async fn play_queue(&self, songs: Vec<Song>, start_index: usize) {
        let result = self.playback.load_queue(songs, start_index).await;
        self.capture(result);
    }

    pub async fn toggle_play_pause(&self) {
        let result = if self.state.borrow().is_playing() {
            self.playback.pause().await
        } else {
            self.playback.play().await
        };
        self.capture(result);
    }

    pub async fn play(&self) {
        let result = self.playback.play().await;
        self.capture(result);
    }

    pub async fn pause(&self) {
        let result = self.playback.pause().await;
        self.capture(result);
    }

    pub async fn stop(&self) {
        let result = self.playback.stop().await;
        self.capture(result);
    }

    pub async fn seek(&self, position_ms: i64) {
        let result = self.playback.seek(position_ms).await;
        self.capture(result);
    }

    pub async fn skip_next(&self) {
        let result = self.playback.skip_next().await;
        self.capture(result);
    }

    pub async fn skip_previous(&self) {
        let result = self.playback.skip_previous().await;
        self.capture(result);
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) {
        self.playback.set_repeat_mode(mode).await;
    }

    pub async fn set_shuffle_mode(&self, mode: ShuffleMode) {
        self.playback.set_shuffle_mode(mode).await;
    }

    pub async fn set_speed(&self, speed: f32) {
        let result = self.playback.set_speed(speed).await;
        self.capture(result);
    }

    /// Recover from a playback error.
    pub async fn reset(&self) {
        self.playback.reset().await;
        self.state.send_modify(|s| s.error = None);
    }
}

impl Drop for PlayerScreen {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
