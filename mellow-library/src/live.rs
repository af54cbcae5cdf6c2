//! Live query support.
//!
//! A live query registers interest in a slice of the library and receives a
//! fresh immutable snapshot after every committed mutation. Snapshots are
//! published through a `tokio::sync::watch` channel: subscribers always see
//! the latest state, in commit order, and a new subscriber gets the current
//! snapshot immediately.
//!
//! The refresh task listens to the store's [`LibraryEvent`] stream. A lagged
//! receiver simply re-runs the query; because snapshots are whole query
//! results rather than deltas, missing intermediate events loses nothing.

use crate::error::Result;
use mellow_runtime::events::{CoreEvent, EventBus, RecvError};
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A registered live query over the library.
///
/// Dropping the handle stops the refresh task; receivers obtained earlier
/// keep the last published snapshot.
pub struct LiveQuery<T> {
    receiver: watch::Receiver<T>,
    refresh_task: JoinHandle<()>,
}

impl<T: Clone> LiveQuery<T> {
    /// A watch receiver for this query's snapshots.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.receiver.clone()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> T {
        self.receiver.borrow().clone()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}

/// Run `query` once for the initial snapshot, then re-run it after every
/// committed library mutation, publishing only snapshots that differ.
pub(crate) async fn spawn_live_query<T, F, Fut>(events: &EventBus, query: F) -> Result<LiveQuery<T>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send,
{
    let initial = query().await?;
    let (tx, rx) = watch::channel(initial);
    let mut event_rx = events.subscribe();

    let refresh_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(CoreEvent::Library(_)) => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Live query lagged behind the event stream");
                }
                Err(RecvError::Closed) => break,
            }

            match query().await {
                Ok(snapshot) => {
                    // send_if_modified keeps receivers from waking on no-op refreshes
                    tx.send_if_modified(|current| {
                        if *current == snapshot {
                            false
                        } else {
                            *current = snapshot;
                            true
                        }
                    });
                }
                Err(e) => {
                    // Keep the previous snapshot; the next mutation retries.
                    warn!(error = %e, "Live query refresh failed");
                }
            }

            if tx.receiver_count() == 0 {
                break;
            }
        }
    });

    Ok(LiveQuery {
        receiver: rx,
        refresh_task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_runtime::events::LibraryEvent;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_initial_snapshot_available_immediately() {
        let bus = EventBus::new(16);
        let live = spawn_live_query(&bus, || async { Ok(vec![1, 2, 3]) })
            .await
            .unwrap();

        assert_eq!(live.snapshot(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_refreshes_on_library_event() {
        let bus = EventBus::new(16);
        let counter = Arc::new(AtomicI64::new(0));
        let query_counter = Arc::clone(&counter);

        let live = spawn_live_query(&bus, move || {
            let counter = Arc::clone(&query_counter);
            async move { Ok(counter.load(Ordering::SeqCst)) }
        })
        .await
        .unwrap();

        let mut rx = live.subscribe();
        assert_eq!(*rx.borrow(), 0);

        counter.store(42, Ordering::SeqCst);
        bus.emit(CoreEvent::Library(LibraryEvent::SongsUpserted { count: 1 }))
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 42);
    }

    #[tokio::test]
    async fn test_non_library_events_do_not_refresh() {
        let bus = EventBus::new(16);
        let counter = Arc::new(AtomicI64::new(0));
        let query_counter = Arc::clone(&counter);

        let live = spawn_live_query(&bus, move || {
            let counter = Arc::clone(&query_counter);
            async move { Ok(counter.load(Ordering::SeqCst)) }
        })
        .await
        .unwrap();

        counter.store(7, Ordering::SeqCst);
        bus.emit(CoreEvent::Playback(
            mellow_runtime::events::PlaybackEvent::Stopped,
        ))
        .unwrap();

        // Give the refresh task a chance to (incorrectly) run
        tokio::task::yield_now().await;
        assert_eq!(live.snapshot(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_not_republished() {
        let bus = EventBus::new(16);
        let live = spawn_live_query(&bus, || async { Ok(5) }).await.unwrap();

        let mut rx = live.subscribe();
        rx.mark_unchanged();

        bus.emit(CoreEvent::Library(LibraryEvent::SongsUpserted { count: 1 }))
            .unwrap();
        tokio::task::yield_now().await;

        assert!(!rx.has_changed().unwrap());
    }
}
