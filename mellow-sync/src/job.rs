//! The catalog sync job.

use crate::error::Result;
use crate::mapper::{merge_with_existing, song_from_remote};
use mellow_bridge::storage::StorageProvider;
use mellow_library::{LibraryStore, Song};
use mellow_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result summary of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub job_id: String,
    pub songs_processed: u64,
    pub pages_fetched: u32,
    pub cancelled: bool,
}

/// Pages the remote catalog into the library.
///
/// Upserts are idempotent, so a failed or cancelled run can simply be
/// re-invoked; completed pages stay persisted.
pub struct CatalogSyncJob {
    provider: Arc<dyn StorageProvider>,
    library: LibraryStore,
    events: EventBus,
    page_size: u32,
}

impl CatalogSyncJob {
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        library: LibraryStore,
        events: EventBus,
        page_size: u32,
    ) -> Self {
        Self {
            provider,
            library,
            events,
            page_size,
        }
    }

    fn emit(&self, event: SyncEvent) {
        self.events.emit(CoreEvent::Sync(event)).ok();
    }

    /// Run a full catalog sync.
    ///
    /// Checks the cancellation token between pages; a cancelled run keeps
    /// everything written so far and reports `cancelled: true`.
    #[instrument(skip_all)]
    pub async fn run(&self, cancel: CancellationToken) -> Result<SyncOutcome> {
        let job_id = Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now();
        let mut songs_processed: u64 = 0;
        let mut pages_fetched: u32 = 0;
        let mut page_token: Option<String> = None;

        info!(job_id = %job_id, "Starting catalog sync");
        self.emit(SyncEvent::Started {
            job_id: job_id.clone(),
        });

        loop {
            if cancel.is_cancelled() {
                info!(job_id = %job_id, songs_processed, "Sync cancelled");
                self.emit(SyncEvent::Cancelled {
                    job_id: job_id.clone(),
                    songs_processed,
                });
                return Ok(SyncOutcome {
                    job_id,
                    songs_processed,
                    pages_fetched,
                    cancelled: true,
                });
            }

            let page = match self
                .provider
                .list_audio_files(page_token.take(), self.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Sync failed while listing catalog");
                    self.emit(SyncEvent::Failed {
                        job_id: job_id.clone(),
                        message: e.to_string(),
                        songs_processed,
                    });
                    return Err(e.into());
                }
            };

            let batch = self.map_page_to_songs(&page.files).await?;

            match self.library.upsert_songs(&batch).await {
                Ok(written) => songs_processed += written,
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Sync failed while writing songs");
                    self.emit(SyncEvent::Failed {
                        job_id: job_id.clone(),
                        message: e.to_string(),
                        songs_processed,
                    });
                    return Err(e.into());
                }
            }

            pages_fetched += 1;
            self.emit(SyncEvent::Progress {
                job_id: job_id.clone(),
                songs_processed,
                pages_fetched,
            });

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        let duration_ms = (chrono::Utc::now() - started_at).num_milliseconds().max(0) as u64;
        info!(job_id = %job_id, songs_processed, pages_fetched, duration_ms, "Sync completed");
        self.emit(SyncEvent::Completed {
            job_id: job_id.clone(),
            songs_processed,
            duration_ms,
        });

        Ok(SyncOutcome {
            job_id,
            songs_processed,
            pages_fetched,
            cancelled: false,
        })
    }

    /// Map one listing page, folding in user-local state of existing rows.
    async fn map_page_to_songs(
        &self,
        files: &[mellow_bridge::storage::RemoteFile],
    ) -> Result<Vec<Song>> {
        let mut batch = Vec::with_capacity(files.len());

        for file in files {
            if file.is_folder || file.trashed {
                continue;
            }

            let fresh = song_from_remote(file);
            let song = match self.library.song(&fresh.id).await? {
                Some(existing) => merge_with_existing(fresh, &existing),
                None => fresh,
            };
            batch.push(song);
        }

        Ok(batch)
    }
}
