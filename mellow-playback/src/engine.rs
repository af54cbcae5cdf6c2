//! The external player-engine boundary.
//!
//! The engine is the platform collaborator that actually makes sound. It
//! exposes transport primitives plus an asynchronous event stream the
//! controller folds back into [`PlaybackState`](crate::PlaybackState).

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use mellow_library::Song;
use tokio::sync::broadcast;

/// Events reported asynchronously by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The most recently loaded song started playing.
    Started,
    /// Periodic position/duration report.
    Position { position_ms: i64, duration_ms: i64 },
    /// Buffering state changed.
    Buffering(bool),
    /// The current song played to its end.
    Completed,
    /// The engine failed; playback is dead until a reload.
    Error(String),
}

/// Transport primitives of an external player engine.
///
/// Control methods return quickly; progress and terminal conditions arrive
/// through [`subscribe`](PlayerEngine::subscribe). Every transition that
/// changes what should be audible is mirrored here by the controller.
#[async_trait]
pub trait PlayerEngine: Send + Sync {
    /// Load a song and begin playback from `start_position_ms`.
    async fn load(&self, song: &Song, start_position_ms: i64) -> Result<()>;

    /// Resume playback of the loaded song.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the position.
    async fn pause(&self) -> Result<()>;

    /// Stop playback and release the audio output.
    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in the loaded song.
    async fn seek(&self, position_ms: i64) -> Result<()>;

    /// Set the playback speed multiplier.
    async fn set_speed(&self, speed: f32) -> Result<()>;

    /// Subscribe to the engine's event stream.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// A headless engine that produces no audio.
///
/// Confirms every load immediately, which drives the state machine through
/// its normal Loading -> Playing transition. Useful for tests, previews,
/// and hosts that wire a real engine in later.
pub struct NullPlayerEngine {
    events: broadcast::Sender<EngineEvent>,
}

impl NullPlayerEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self { events }
    }

    /// Emit an event as if the platform engine produced it.
    pub fn emit(&self, event: EngineEvent) -> Result<()> {
        self.events
            .send(event)
            .map(|_| ())
            .map_err(|_| PlaybackError::Engine("no engine event subscribers".to_string()))
    }
}

impl Default for NullPlayerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerEngine for NullPlayerEngine {
    async fn load(&self, _song: &Song, _start_position_ms: i64) -> Result<()> {
        // Nothing to prepare; report the start right away.
        self.events.send(EngineEvent::Started).ok();
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn seek(&self, _position_ms: i64) -> Result<()> {
        Ok(())
    }

    async fn set_speed(&self, _speed: f32) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}
