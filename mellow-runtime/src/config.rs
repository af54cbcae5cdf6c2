//! Application configuration.
//!
//! A single [`AppConfig`] value is built at startup and handed to every
//! component by construction; nothing reads configuration from ambient
//! global state.

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use std::path::PathBuf;

/// Default page size for catalog listings.
pub const DEFAULT_SYNC_PAGE_SIZE: u32 = 100;

/// Default row limit for recency and play-count queries.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// OAuth client settings for the cloud storage provider.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    /// OAuth client ID issued by the provider console
    pub client_id: String,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/drive.readonly".to_string()],
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file path, or `None` for an in-memory database
    pub database_path: Option<PathBuf>,
    /// OAuth client settings
    pub oauth: OAuthSettings,
    /// Page size used when listing the remote catalog
    pub sync_page_size: u32,
    /// Row limit for recently-played queries
    pub recently_played_limit: u32,
    /// Row limit for most-played queries
    pub most_played_limit: u32,
    /// Event bus buffer size
    pub event_buffer_size: usize,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            oauth: OAuthSettings::default(),
            sync_page_size: DEFAULT_SYNC_PAGE_SIZE,
            recently_played_limit: DEFAULT_HISTORY_LIMIT,
            most_played_limit: DEFAULT_HISTORY_LIMIT,
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Configuration backed by an on-disk database at `path`.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Configuration backed by an in-memory database (tests, previews).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set the OAuth client settings.
    pub fn with_oauth(mut self, oauth: OAuthSettings) -> Self {
        self.oauth = oauth;
        self
    }

    /// Set the catalog listing page size.
    pub fn with_sync_page_size(mut self, page_size: u32) -> Self {
        self.sync_page_size = page_size;
        self
    }

    /// Set the logging configuration.
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a field is out of its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.sync_page_size == 0 {
            return Err(Error::Config("sync_page_size must be positive".to_string()));
        }

        if self.sync_page_size > 1000 {
            return Err(Error::Config(
                "sync_page_size exceeds the provider maximum of 1000".to_string(),
            ));
        }

        if self.recently_played_limit == 0 || self.most_played_limit == 0 {
            return Err(Error::Config("history limits must be positive".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
