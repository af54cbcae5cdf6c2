//! # Presentation State Holders
//!
//! Per-screen observable state over the core crates. Each holder keeps a
//! UI-facing snapshot (loading flag, data lists, error message), exposes
//! intent methods that delegate to the library, session, catalog, and
//! playback layers, and replaces its snapshot atomically on every
//! state-producing event. Failures from collaborators land in the snapshot
//! as display strings; nothing propagates past a holder.

pub mod context;
pub mod error;
pub mod nav;
pub mod screens;

pub use context::AppContext;
pub use error::{Result, ScreenError};
pub use nav::Screen;
pub use screens::auth::{AuthScreen, AuthScreenState};
pub use screens::favorites::{FavoritesScreen, FavoritesScreenState};
pub use screens::home::{HomeScreen, HomeScreenState};
pub use screens::player::{PlayerScreen, PlayerScreenState};
pub use screens::playlists::{PlaylistsScreen, PlaylistsScreenState};
pub use screens::search::{SearchScreen, SearchScreenState};
