//! # Event Bus System
//!
//! Event-driven communication between core modules, built on
//! `tokio::sync::broadcast`. Modules emit strongly-typed events; any number
//! of subscribers consume them independently. Slow subscribers receive
//! `RecvError::Lagged` rather than blocking fast ones.
//!
//! ## Usage
//!
//! ```rust
//! use mellow_runtime::events::{EventBus, CoreEvent, AuthEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Auth(AuthEvent::SignedIn {
//!         email: "user@example.com".to_string(),
//!     }))
//!     .ok();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Catalog sync events
    Sync(SyncEvent),
    /// Library content events
    Library(LibraryEvent),
    /// Playback lifecycle events
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to the signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Authorization flow in progress.
    SigningIn,
    /// Account successfully authenticated.
    SignedIn {
        /// Email address of the signed-in account.
        email: String,
    },
    /// Account signed out.
    SignedOut {
        /// Email address of the account that was signed out.
        email: String,
    },
    /// Authentication error occurred.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether the error is recoverable (e.g., retry possible).
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SigningIn => "Authentication in progress",
            AuthEvent::SignedIn { .. } => "Account signed in",
            AuthEvent::SignedOut { .. } => "Account signed out",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events emitted while synchronizing the remote catalog into the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Sync job initiated.
    Started {
        /// Unique identifier for this sync job.
        job_id: String,
    },
    /// Incremental progress update during sync.
    Progress {
        /// The sync job ID.
        job_id: String,
        /// Number of songs processed so far.
        songs_processed: u64,
        /// Number of catalog pages fetched so far.
        pages_fetched: u32,
    },
    /// Sync finished successfully.
    Completed {
        /// The sync job ID.
        job_id: String,
        /// Total songs upserted into the library.
        songs_processed: u64,
        /// Duration of the sync in milliseconds.
        duration_ms: u64,
    },
    /// Sync encountered an error and stopped.
    Failed {
        /// The sync job ID.
        job_id: String,
        /// Human-readable error message.
        message: String,
        /// Number of songs processed before failure.
        songs_processed: u64,
    },
    /// Sync was cancelled.
    Cancelled {
        /// The sync job ID.
        job_id: String,
        /// Number of songs processed before cancellation.
        songs_processed: u64,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Sync started",
            SyncEvent::Progress { .. } => "Sync in progress",
            SyncEvent::Completed { .. } => "Sync completed successfully",
            SyncEvent::Failed { .. } => "Sync failed",
            SyncEvent::Cancelled { .. } => "Sync cancelled",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events describing committed library mutations.
///
/// Live queries key their refresh off these, so every store mutation must
/// emit exactly one after its transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// One or more songs inserted or replaced.
    SongsUpserted {
        /// Number of rows written.
        count: u64,
    },
    /// A song's favorite flag changed.
    FavoriteChanged {
        /// The song ID.
        song_id: String,
        /// New favorite state.
        is_favorite: bool,
    },
    /// A completed play start was recorded for a song.
    PlayRecorded {
        /// The song ID.
        song_id: String,
    },
    /// A song's download state changed.
    DownloadStateChanged {
        /// The song ID.
        song_id: String,
        /// Whether the song is now cached locally.
        is_downloaded: bool,
    },
    /// A song was removed from the library.
    SongDeleted {
        /// The song ID that was deleted.
        song_id: String,
    },
    /// New playlist created.
    PlaylistCreated {
        /// The playlist ID.
        playlist_id: String,
        /// Playlist name.
        name: String,
    },
    /// Playlist renamed or its metadata updated.
    PlaylistUpdated {
        /// The playlist ID.
        playlist_id: String,
    },
    /// Playlist deleted.
    PlaylistDeleted {
        /// The playlist ID.
        playlist_id: String,
    },
    /// Playlist membership changed (song added or removed).
    MembershipChanged {
        /// The playlist ID whose membership changed.
        playlist_id: String,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::SongsUpserted { .. } => "Songs upserted",
            LibraryEvent::FavoriteChanged { .. } => "Favorite flag changed",
            LibraryEvent::PlayRecorded { .. } => "Play recorded",
            LibraryEvent::DownloadStateChanged { .. } => "Download state changed",
            LibraryEvent::SongDeleted { .. } => "Song removed from library",
            LibraryEvent::PlaylistCreated { .. } => "Playlist created",
            LibraryEvent::PlaylistUpdated { .. } => "Playlist updated",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
            LibraryEvent::MembershipChanged { .. } => "Playlist membership changed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to audio playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback started for a song.
    Started {
        /// The song ID being played.
        song_id: String,
    },
    /// Playback paused.
    Paused {
        /// The song ID.
        song_id: String,
        /// Position when paused (milliseconds).
        position_ms: i64,
    },
    /// Playback stopped.
    Stopped,
    /// Song finished playing naturally.
    Completed {
        /// The song ID that completed.
        song_id: String,
    },
    /// Playback error occurred.
    Error {
        /// Human-readable error message.
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Song completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// bus), multiple independent consumers, non-blocking sends, and lagging
/// detection for slow subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged` instead of stalling the senders.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers. Emitting into an empty bus
    /// is not a fault; callers typically `.ok()` the result.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that observes all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
