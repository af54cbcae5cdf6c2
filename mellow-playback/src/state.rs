//! The in-memory playback model.
//!
//! [`PlaybackState`] is never persisted; it is rebuilt at process start and
//! mutated only by the controller. Derived values (`progress`, `has_next`,
//! `has_previous`) are always recomputed, never stored.

use mellow_library::Song;
use serde::{Deserialize, Serialize};

/// Player lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
    /// Playback failure; recoverable only by an explicit reset or reload.
    Error(String),
}

/// Repeat behavior at queue navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

/// Shuffle behavior for the upcoming portion of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleMode {
    Off,
    On,
}

/// Snapshot of everything the UI needs to render playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// The song currently loaded, if any
    pub current_song: Option<Song>,
    /// Lifecycle state
    pub player_state: PlayerState,
    /// Position in the current song, milliseconds
    pub position_ms: i64,
    /// Duration of the current song, milliseconds
    pub duration_ms: i64,
    /// Playback speed multiplier
    pub speed: f32,
    /// Repeat mode
    pub repeat_mode: RepeatMode,
    /// Shuffle mode
    pub shuffle_mode: ShuffleMode,
    /// The ordered queue of songs eligible for navigation
    pub queue: Vec<Song>,
    /// Index into `queue`; -1 when the queue is empty or unset
    pub current_index: i32,
    /// Whether the engine is currently buffering
    pub is_buffering: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_song: None,
            player_state: PlayerState::Idle,
            position_ms: 0,
            duration_ms: 0,
            speed: 1.0,
            repeat_mode: RepeatMode::Off,
            shuffle_mode: ShuffleMode::Off,
            queue: Vec::new(),
            current_index: -1,
            is_buffering: false,
        }
    }
}

impl PlaybackState {
    /// Progress through the current song as a fraction in [0, 1].
    ///
    /// Zero-duration songs report 0 progress.
    pub fn progress(&self) -> f32 {
        if self.duration_ms > 0 {
            (self.position_ms as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether a skip-next would land on a song.
    ///
    /// Repeat One and All always report `true` for a non-empty queue;
    /// Off depends on the index relative to the end.
    pub fn has_next(&self) -> bool {
        match self.repeat_mode {
            RepeatMode::One => !self.queue.is_empty(),
            RepeatMode::All => !self.queue.is_empty(),
            RepeatMode::Off => self.current_index < self.queue.len() as i32 - 1,
        }
    }

    /// Whether a skip-previous would land on a song.
    pub fn has_previous(&self) -> bool {
        match self.repeat_mode {
            RepeatMode::One => !self.queue.is_empty(),
            RepeatMode::All => !self.queue.is_empty(),
            RepeatMode::Off => self.current_index > 0,
        }
    }

    /// Whether playback is in a terminal failure state.
    pub fn is_error(&self) -> bool {
        matches!(self.player_state, PlayerState::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song::new(id, id, "Artist", "Album", 200_000, id, "audio/mpeg")
    }

    fn state_with_queue(len: usize, index: i32) -> PlaybackState {
        let queue: Vec<Song> = (0..len).map(|i| song(&format!("s{}", i))).collect();
        PlaybackState {
            current_song: queue.get(index.max(0) as usize).cloned(),
            queue,
            current_index: index,
            ..PlaybackState::default()
        }
    }

    #[test]
    fn test_progress_zero_duration() {
        let state = PlaybackState {
            position_ms: 5000,
            duration_ms: 0,
            ..PlaybackState::default()
        };
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn test_progress_fraction() {
        let state = PlaybackState {
            position_ms: 50_000,
            duration_ms: 200_000,
            ..PlaybackState::default()
        };
        assert!((state.progress() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_clamped() {
        let state = PlaybackState {
            position_ms: 250_000,
            duration_ms: 200_000,
            ..PlaybackState::default()
        };
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_repeat_one_always_navigable_when_nonempty() {
        let mut state = state_with_queue(1, 0);
        state.repeat_mode = RepeatMode::One;
        assert!(state.has_next());
        assert!(state.has_previous());

        let mut empty = state_with_queue(0, -1);
        empty.repeat_mode = RepeatMode::One;
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }

    #[test]
    fn test_repeat_all_always_navigable_when_nonempty() {
        let mut state = state_with_queue(3, 2);
        state.repeat_mode = RepeatMode::All;
        assert!(state.has_next());
        assert!(state.has_previous());
    }

    #[test]
    fn test_repeat_off_edges() {
        let mut state = state_with_queue(3, 2);
        state.repeat_mode = RepeatMode::Off;
        assert!(!state.has_next(), "at the last index there is no next");
        assert!(state.has_previous());

        state.current_index = 0;
        assert!(state.has_next());
        assert!(!state.has_previous(), "at the first index there is no previous");

        state.current_index = 1;
        assert!(state.has_next());
        assert!(state.has_previous());
    }

    #[test]
    fn test_default_state() {
        let state = PlaybackState::default();
        assert_eq!(state.current_index, -1);
        assert_eq!(state.player_state, PlayerState::Idle);
        assert!(state.queue.is_empty());
        assert!(!state.has_next());
        assert!(!state.has_previous());
        assert_eq!(state.speed, 1.0);
    }
}
