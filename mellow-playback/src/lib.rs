//! # Playback State Machine
//!
//! The single source of truth for "what is playing". The
//! [`PlaybackController`] converts transport intents into a new
//! [`PlaybackState`] and mirrors every audible change to the external
//! [`PlayerEngine`], so in-app UI and platform media controls never
//! disagree.

pub mod controller;
pub mod engine;
pub mod error;
pub mod state;

pub use controller::PlaybackController;
pub use engine::{EngineEvent, NullPlayerEngine, PlayerEngine};
pub use error::{PlaybackError, Result};
pub use state::{PlaybackState, PlayerState, RepeatMode, ShuffleMode};
