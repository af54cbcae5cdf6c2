//! The playback controller.
//!
//! A single-writer, single-instance state machine: transport intents are
//! applied in arrival order under one lock, every audible change is mirrored
//! to the engine, and engine callbacks are folded back into the published
//! [`PlaybackState`]. Observers subscribe through a watch channel and always
//! see the latest snapshot.

use crate::engine::{EngineEvent, PlayerEngine};
use crate::error::{PlaybackError, Result};
use crate::state::{PlaybackState, PlayerState, RepeatMode, ShuffleMode};
use mellow_library::Song;
use mellow_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use rand::Rng;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

struct Inner {
    state: PlaybackState,
    /// Queue order before shuffle was enabled; restored when it is
    /// disabled again.
    original_queue: Option<Vec<Song>>,
}

/// Single source of truth for playback, one instance per process.
pub struct PlaybackController {
    engine: Arc<dyn PlayerEngine>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<PlaybackState>,
    event_pump: StdMutex<Option<JoinHandle<()>>>,
    events: Option<EventBus>,
}

impl PlaybackController {
    /// Create the controller and start folding the engine's event stream.
    pub fn new(engine: Arc<dyn PlayerEngine>) -> Arc<Self> {
        Self::build(engine, None)
    }

    /// Like [`new`](Self::new), but lifecycle transitions are also
    /// announced on the application event bus.
    pub fn with_events(engine: Arc<dyn PlayerEngine>, events: EventBus) -> Arc<Self> {
        Self::build(engine, Some(events))
    }

    fn build(engine: Arc<dyn PlayerEngine>, events: Option<EventBus>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(PlaybackState::default());

        let controller = Arc::new(Self {
            engine: Arc::clone(&engine),
            inner: Mutex::new(Inner {
                state: PlaybackState::default(),
                original_queue: None,
            }),
            state_tx,
            event_pump: StdMutex::new(None),
            events,
        });

        let weak = Arc::downgrade(&controller);
        let mut events = engine.subscribe();
        let pump = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(controller) = weak.upgrade() else {
                            break;
                        };
                        controller.handle_engine_event(event).await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Engine event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        *controller
            .event_pump
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(pump);

        controller
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// The current state snapshot.
    pub fn state(&self) -> PlaybackState {
        self.state_tx.borrow().clone()
    }

    /// Stop folding engine events. Call on service teardown so nothing
    /// mutates the state machine after its owner is gone.
    pub fn shutdown(&self) {
        if let Some(pump) = self
            .event_pump
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            pump.abort();
        }
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
    }

    fn announce(&self, event: PlaybackEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Playback(event)).ok();
        }
    }

    /// Fold an engine failure into the Error state and report it.
    fn fold_engine_failure(&self, inner: &mut Inner, error: PlaybackError) -> PlaybackError {
        let message = match &error {
            PlaybackError::Engine(m) => m.clone(),
            other => other.to_string(),
        };
        warn!(error = %message, "Engine call failed");
        inner.state.player_state = PlayerState::Error(message.clone());
        inner.state.is_buffering = false;
        self.publish(inner);
        self.announce(PlaybackEvent::Error {
            message: message.clone(),
        });
        PlaybackError::Engine(message)
    }

    /// Point the state at `index`, enter Loading, and hand the song to the
    /// engine. `Started` from the engine completes the transition.
    async fn jump_to(&self, inner: &mut Inner, index: i32) -> Result<()> {
        let song = match inner.state.queue.get(index as usize) {
            Some(song) => song.clone(),
            None => return Ok(()),
        };

        inner.state.current_index = index;
        inner.state.current_song = Some(song.clone());
        inner.state.position_ms = 0;
        inner.state.duration_ms = song.duration_ms;
        inner.state.player_state = PlayerState::Loading;
        self.publish(inner);

        if let Err(e) = self.engine.load(&song, 0).await {
            return Err(self.fold_engine_failure(inner, e));
        }
        Ok(())
    }

    fn shuffle_upcoming(inner: &mut Inner) {
        inner.original_queue = Some(inner.state.queue.clone());

        // Keep played history and the current song in place; shuffle what
        // comes after (Fisher-Yates over the tail).
        let start = (inner.state.current_index + 1).max(0) as usize;
        let queue = &mut inner.state.queue;
        let len = queue.len();
        if start + 1 >= len {
            return;
        }

        let mut rng = rand::thread_rng();
        for i in ((start + 1)..len).rev() {
            let j = rng.gen_range(start..=i);
            queue.swap(i, j);
        }
    }

    fn restore_original_order(inner: &mut Inner) {
        let Some(original) = inner.original_queue.take() else {
            return;
        };

        let current_id = inner.state.current_song.as_ref().map(|s| s.id.clone());
        inner.state.queue = original;

        if let Some(id) = current_id {
            if let Some(position) = inner.state.queue.iter().position(|s| s.id == id) {
                inner.state.current_index = position as i32;
            }
        }
    }

    // =========================================================================
    // Transport intents
    // =========================================================================

    /// Replace the queue and start playing from `start_index` (clamped).
    ///
    /// An empty list clears the queue and returns to Idle.
    #[instrument(skip(self, songs), fields(count = songs.len()))]
    pub async fn load_queue(&self, songs: Vec<Song>, start_index: usize) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if songs.is_empty() {
            inner.state.queue.clear();
            inner.state.current_index = -1;
            inner.state.current_song = None;
            inner.state.position_ms = 0;
            inner.state.duration_ms = 0;
            inner.state.is_buffering = false;
            inner.state.player_state = PlayerState::Idle;
            inner.original_queue = None;
            self.publish(&inner);

            // Nothing should stay audible after clearing the queue
            if let Err(e) = self.engine.stop().await {
                return Err(self.fold_engine_failure(&mut inner, e));
            }
            return Ok(());
        }

        let index = start_index.min(songs.len() - 1) as i32;
        info!(count = songs.len(), index, "Loading queue");

        inner.state.queue = songs;
        inner.original_queue = None;
        inner.state.is_buffering = false;
        inner.state.current_index = index;

        if inner.state.shuffle_mode == ShuffleMode::On {
            // The fresh order becomes the shuffle baseline
            Self::shuffle_upcoming(&mut inner);
        }

        self.jump_to(&mut inner, index).await
    }

    /// Resume playback. A no-op without a loaded song.
    pub async fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state.current_song.is_none() {
            return Ok(());
        }

        if let Err(e) = self.engine.play().await {
            return Err(self.fold_engine_failure(&mut inner, e));
        }

        inner.state.player_state = PlayerState::Playing;
        self.publish(&inner);
        Ok(())
    }

    /// Pause playback, keeping the position.
    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state.current_song.is_none() {
            return Ok(());
        }

        if let Err(e) = self.engine.pause().await {
            return Err(self.fold_engine_failure(&mut inner, e));
        }

        inner.state.player_state = PlayerState::Paused;
        self.publish(&inner);
        if let Some(song) = &inner.state.current_song {
            self.announce(PlaybackEvent::Paused {
                song_id: song.id.clone(),
                position_ms: inner.state.position_ms,
            });
        }
        Ok(())
    }

    /// Stop playback. Position resets to 0; queue and index are retained.
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Err(e) = self.engine.stop().await {
            return Err(self.fold_engine_failure(&mut inner, e));
        }

        inner.state.player_state = PlayerState::Stopped;
        inner.state.position_ms = 0;
        inner.state.is_buffering = false;
        self.publish(&inner);
        self.announce(PlaybackEvent::Stopped);
        Ok(())
    }

    /// Seek to `position_ms`, clamped to `[0, duration]`. Lifecycle state
    /// is unchanged.
    pub async fn seek(&self, position_ms: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let clamped = position_ms.clamp(0, inner.state.duration_ms);
        if let Err(e) = self.engine.seek(clamped).await {
            return Err(self.fold_engine_failure(&mut inner, e));
        }

        inner.state.position_ms = clamped;
        self.publish(&inner);
        Ok(())
    }

    /// Advance to the next song per the repeat mode.
    ///
    /// Repeat One restarts the current song; All wraps past the end; Off
    /// stops advancing at the last index (a silent no-op, not an error).
    #[instrument(skip(self))]
    pub async fn skip_next(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let len = inner.state.queue.len() as i32;
        if len == 0 || inner.state.current_index < 0 {
            return Ok(());
        }

        match inner.state.repeat_mode {
            RepeatMode::One => self.restart_current(&mut inner).await,
            RepeatMode::All => {
                let next = (inner.state.current_index + 1) % len;
                self.jump_to(&mut inner, next).await
            }
            RepeatMode::Off => {
                if inner.state.current_index < len - 1 {
                    let next = inner.state.current_index + 1;
                    self.jump_to(&mut inner, next).await
                } else {
                    debug!("Skip-next at end of queue with repeat off; nothing to do");
                    Ok(())
                }
            }
        }
    }

    /// Go back to the previous song per the repeat mode (symmetric to
    /// [`skip_next`](Self::skip_next)).
    #[instrument(skip(self))]
    pub async fn skip_previous(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let len = inner.state.queue.len() as i32;
        if len == 0 || inner.state.current_index < 0 {
            return Ok(());
        }

        match inner.state.repeat_mode {
            RepeatMode::One => self.restart_current(&mut inner).await,
            RepeatMode::All => {
                let previous = (inner.state.current_index - 1 + len) % len;
                self.jump_to(&mut inner, previous).await
            }
            RepeatMode::Off => {
                if inner.state.current_index > 0 {
                    let previous = inner.state.current_index - 1;
                    self.jump_to(&mut inner, previous).await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Restart the current song from position 0 without changing the index.
    async fn restart_current(&self, inner: &mut Inner) -> Result<()> {
        inner.state.position_ms = 0;
        self.publish(inner);

        if let Err(e) = self.engine.seek(0).await {
            return Err(self.fold_engine_failure(inner, e));
        }
        Ok(())
    }

    /// Set the repeat mode. Pure state mutation.
    pub async fn set_repeat_mode(&self, mode: RepeatMode) {
        let mut inner = self.inner.lock().await;
        inner.state.repeat_mode = mode;
        self.publish(&inner);
    }

    /// Set the shuffle mode.
    ///
    /// Enabling reorders the upcoming portion of the queue; disabling
    /// restores the original order and re-locates the current song, so an
    /// enable/disable round trip is lossless.
    pub async fn set_shuffle_mode(&self, mode: ShuffleMode) {
        let mut inner = self.inner.lock().await;
        if inner.state.shuffle_mode == mode {
            return;
        }

        match mode {
            ShuffleMode::On => Self::shuffle_upcoming(&mut inner),
            ShuffleMode::Off => Self::restore_original_order(&mut inner),
        }

        inner.state.shuffle_mode = mode;
        self.publish(&inner);
    }

    /// Set the playback speed multiplier, forwarded to the engine.
    pub async fn set_speed(&self, speed: f32) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(PlaybackError::InvalidSpeed(speed));
        }

        let mut inner = self.inner.lock().await;
        if let Err(e) = self.engine.set_speed(speed).await {
            return Err(self.fold_engine_failure(&mut inner, e));
        }

        inner.state.speed = speed;
        self.publish(&inner);
        Ok(())
    }

    /// Recover from the Error state back to Idle. Queue and song are kept
    /// so the caller can reload.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state.player_state = PlayerState::Idle;
        inner.state.position_ms = 0;
        inner.state.is_buffering = false;
        self.publish(&inner);
    }

    // =========================================================================
    // Engine callbacks
    // =========================================================================

    /// Fold one engine event into the state machine.
    ///
    /// Normally driven by the internal event pump; exposed so hosts with
    /// their own callback plumbing can feed events directly.
    pub async fn handle_engine_event(&self, event: EngineEvent) {
        let mut inner = self.inner.lock().await;

        match event {
            EngineEvent::Started => {
                if inner.state.player_state == PlayerState::Loading {
                    inner.state.player_state = PlayerState::Playing;
                    inner.state.is_buffering = false;
                    self.publish(&inner);
                    if let Some(song) = &inner.state.current_song {
                        self.announce(PlaybackEvent::Started {
                            song_id: song.id.clone(),
                        });
                    }
                }
            }
            EngineEvent::Position {
                position_ms,
                duration_ms,
            } => {
                inner.state.position_ms = position_ms.max(0);
                if duration_ms > 0 {
                    inner.state.duration_ms = duration_ms;
                }
                self.publish(&inner);
            }
            EngineEvent::Buffering(buffering) => {
                inner.state.is_buffering = buffering;
                self.publish(&inner);
            }
            EngineEvent::Completed => {
                if let Some(song) = &inner.state.current_song {
                    self.announce(PlaybackEvent::Completed {
                        song_id: song.id.clone(),
                    });
                }
                self.advance_after_completion(&mut inner).await;
            }
            EngineEvent::Error(message) => {
                warn!(error = %message, "Engine reported failure");
                inner.state.player_state = PlayerState::Error(message.clone());
                inner.state.is_buffering = false;
                self.publish(&inner);
                self.announce(PlaybackEvent::Error { message });
            }
        }
    }

    /// Natural end of a song: advance according to the repeat mode, or
    /// stop at the end of the queue.
    async fn advance_after_completion(&self, inner: &mut Inner) {
        let len = inner.state.queue.len() as i32;
        if len == 0 || inner.state.current_index < 0 {
            return;
        }

        let result = match inner.state.repeat_mode {
            RepeatMode::One => {
                let index = inner.state.current_index;
                self.jump_to(inner, index).await
            }
            RepeatMode::All => {
                let next = (inner.state.current_index + 1) % len;
                self.jump_to(inner, next).await
            }
            RepeatMode::Off => {
                if inner.state.current_index < len - 1 {
                    let next = inner.state.current_index + 1;
                    self.jump_to(inner, next).await
                } else {
                    inner.state.player_state = PlayerState::Stopped;
                    inner.state.position_ms = 0;
                    self.publish(inner);
                    Ok(())
                }
            }
        };

        // jump_to already folded any engine failure into the Error state
        result.ok();
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
