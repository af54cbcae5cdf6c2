//! Application context.
//!
//! Every component is constructed once, here, and handed to whoever needs
//! it. There is no ambient global state: hosts build an [`AppContext`] at
//! startup and pass it (or pieces of it) down by value.

use crate::error::Result;
use mellow_auth::IdentitySession;
use mellow_bridge::http::HttpClient;
use mellow_bridge::storage::SecureStore;
use mellow_library::db::DatabaseConfig;
use mellow_library::LibraryStore;
use mellow_playback::{PlaybackController, PlayerEngine};
use mellow_runtime::config::AppConfig;
use mellow_runtime::events::EventBus;
use mellow_sync::CatalogSyncJob;
use provider_google_drive::GoogleDriveConnector;
use std::sync::Arc;
use tracing::info;

/// The constructed object graph of the player core.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub events: EventBus,
    pub library: LibraryStore,
    pub session: Arc<IdentitySession>,
    pub catalog: Arc<GoogleDriveConnector>,
    pub playback: Arc<PlaybackController>,
}

impl AppContext {
    /// Build the full context from a validated configuration and the
    /// host-provided boundary implementations (HTTP transport, secure
    /// credential storage, player engine).
    pub async fn build(
        config: AppConfig,
        http: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        engine: Arc<dyn PlayerEngine>,
    ) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);

        let db_config = match &config.database_path {
            Some(path) => DatabaseConfig::new(path.clone()),
            None => DatabaseConfig::in_memory(),
        };
        let library = LibraryStore::open(db_config, events.clone()).await?;

        let session = Arc::new(IdentitySession::new(
            config.oauth.clone(),
            secure_store,
            events.clone(),
        ));

        let catalog = Arc::new(GoogleDriveConnector::new(http));

        // A returning user is already signed in; bind the catalog up front.
        if let Ok(Some(account)) = session.current_account().await {
            info!(email = %account.email, "Restoring catalog binding for cached account");
            catalog.initialize(account);
        }

        let playback = PlaybackController::with_events(engine, events.clone());

        Ok(Self {
            config,
            events,
            library,
            session,
            catalog,
            playback,
        })
    }

    /// Bind the catalog to the currently signed-in account.
    ///
    /// Returns `false` (without error) when nobody is signed in.
    pub async fn connect_catalog(&self) -> bool {
        match self.session.current_account().await {
            Ok(Some(account)) => {
                self.catalog.initialize(account);
                true
            }
            _ => false,
        }
    }

    /// A sync job wired against this context's catalog and library.
    pub fn sync_job(&self) -> CatalogSyncJob {
        CatalogSyncJob::new(
            self.catalog.clone(),
            self.library.clone(),
            self.events.clone(),
            self.config.sync_page_size,
        )
    }
}
