// Bridges the sans-IO feed to an async media source for the synchronous TUI loop

use crate::domain::{MediaItem, MediaKind, MediaPage, PhotoFeed};
use crate::error::{PhotoBurnError, Result};
use crate::media_source::{delete_items, fetch_page, MediaSource};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What one `pump` call settled
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PumpReport {
    pub pages_received: usize,
    pub deletes_completed: usize,
    /// Ids whose trash operation failed
    pub failed_deletes: Vec<String>,
}

struct PendingDelete {
    id: String,
    receiver: oneshot::Receiver<Result<()>>,
}

/// Runs page fetches and trash operations on a private runtime and hands
/// results back through oneshot channels polled from the UI thread.
pub struct FeedLoader {
    source: Arc<dyn MediaSource>,
    kinds: Vec<MediaKind>,
    runtime: tokio::runtime::Runtime,
    page: Option<oneshot::Receiver<Result<MediaPage>>>,
    deletes: Vec<PendingDelete>,
}

impl FeedLoader {
    pub fn new(source: Arc<dyn MediaSource>, kinds: Vec<MediaKind>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            source,
            kinds,
            runtime,
            page: None,
            deletes: Vec::new(),
        })
    }

    /// Starts the request the feed has scheduled, if any
    pub fn dispatch(&mut self, feed: &mut PhotoFeed) -> bool {
        let request = match feed.take_request() {
            Some(request) => request,
            None => return false,
        };

        let (tx, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let kinds = self.kinds.clone();
        self.runtime.spawn(async move {
            let outcome = fetch_page(source.as_ref(), &request, &kinds).await;
            let _ = tx.send(outcome);
        });

        debug!("Dispatched page fetch");
        self.page = Some(rx);
        true
    }

    /// Moves an item to the trash in the background
    pub fn delete(&mut self, item: &MediaItem) {
        let (tx, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let items = vec![item.clone()];
        self.runtime.spawn(async move {
            let outcome = delete_items(source.as_ref(), &items).await;
            let _ = tx.send(outcome);
        });

        self.deletes.push(PendingDelete {
            id: item.id.clone(),
            receiver: rx,
        });
    }

    /// Applies whatever has completed and starts any newly scheduled fetch.
    /// Never blocks.
    pub fn pump(&mut self, feed: &mut PhotoFeed) -> PumpReport {
        let mut report = PumpReport::default();

        if let Some(rx) = self.page.as_mut() {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.page = None;
                    feed.receive_page(outcome);
                    report.pages_received += 1;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.page = None;
                    feed.receive_page(Err(PhotoBurnError::FetchFailed(
                        "page task dropped".to_string(),
                    )));
                }
            }
        }

        self.deletes.retain_mut(|pending| match pending.receiver.try_recv() {
            Ok(Ok(())) => {
                report.deletes_completed += 1;
                false
            }
            Ok(Err(e)) => {
                warn!(id = %pending.id, error = %e, "Failed to move item to trash");
                report.failed_deletes.push(pending.id.clone());
                false
            }
            Err(oneshot::error::TryRecvError::Empty) => true,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!(id = %pending.id, "Trash task dropped");
                report.failed_deletes.push(pending.id.clone());
                false
            }
        });

        self.dispatch(feed);
        report
    }

    /// Blocks until no fetch or trash operation is outstanding
    pub fn wait_idle(&mut self, feed: &mut PhotoFeed) -> PumpReport {
        let mut report = PumpReport::default();

        loop {
            self.dispatch(feed);

            let page = match self.page.take() {
                Some(rx) => rx,
                None => break,
            };
            let outcome = self.runtime.block_on(page).unwrap_or_else(|_| {
                Err(PhotoBurnError::FetchFailed("page task dropped".to_string()))
            });
            feed.receive_page(outcome);
            report.pages_received += 1;
        }

        for pending in self.deletes.drain(..) {
            match self.runtime.block_on(pending.receiver) {
                Ok(Ok(())) => report.deletes_completed += 1,
                Ok(Err(e)) => {
                    warn!(id = %pending.id, error = %e, "Failed to move item to trash");
                    report.failed_deletes.push(pending.id);
                }
                Err(_) => report.failed_deletes.push(pending.id),
            }
        }

        report
    }

    pub fn is_busy(&self) -> bool {
        self.page.is_some() || !self.deletes.is_empty()
    }
}
