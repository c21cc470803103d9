//! Cycle-safe depth-first walk of a Gopher server
//!
//! The traverser keeps an explicit stack of pending items and a visited set
//! keyed by (host, port, selector). Each popped item goes through:
//!
//! `Discovered -> (Deduplicated | Visiting) -> Classified -> (Recursed) -> Done`
//!
//! - A key is marked visited before its request is issued, so a directory
//!   that lists itself (directly or through a cycle) is expanded only once.
//! - Children are pushed in reverse listing order, so the first listed child
//!   is processed first and a directory's subtree is finished before its
//!   next sibling. No sorting is ever applied.
//! - Items on another host or port are handed to the external prober and
//!   never requested.
//!
//! Requests against the target are issued strictly one at a time.

use crate::gopher::{
    ConnectionError, Endpoint, ExpectedKind, Fetcher, Item, ItemType, Listing, Response,
    TextDocument, VisitedKey,
};
use crate::probe::ExternalProber;
use crate::state::{CrawlState, ItemEvent};
use crate::CrawlError;
use std::io;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// How often progress is logged, in visited items
const PROGRESS_INTERVAL: usize = 10;

/// The result of a finished or cancelled walk
#[derive(Debug)]
pub struct Traversal {
    /// Accumulated statistics, with all probe results committed
    pub state: CrawlState,

    /// True if the walk stopped because of cancellation
    pub cancelled: bool,
}

/// Drives one crawl of a single target endpoint
pub struct Traverser<F: Fetcher> {
    fetcher: F,
    prober: ExternalProber,
    state: CrawlState,
    work: Vec<Item>,
    root: VisitedKey,
    cancel: CancellationToken,
}

impl<F: Fetcher> Traverser<F> {
    /// Creates a traverser seeded with the root of `target`
    pub fn new(target: Endpoint, fetcher: F, prober: ExternalProber) -> Self {
        let root = Item::root(target.host.clone(), target.port);

        Self {
            fetcher,
            prober,
            root: root.key(),
            work: vec![root],
            state: CrawlState::new(target),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to stop the walk early
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the walk until the work stack is empty or the crawl is cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Traversal)` - The walk finished, possibly early on cancellation
    /// * `Err(CrawlError::RootUnreachable)` - The root listing could not be fetched
    pub async fn run(mut self) -> Result<Traversal, CrawlError> {
        tracing::info!("Starting crawl of {}", self.state.target());

        let start_time = Instant::now();
        let mut cancelled = false;
        let mut processed = 0usize;

        while let Some(item) = self.work.pop() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    "Crawl cancelled with {} items still pending",
                    self.work.len() + 1
                );
                cancelled = true;
                break;
            }

            if !self.visit(item).await? {
                continue;
            }

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} items visited, {} pending, {:.2} items/sec",
                    processed,
                    self.work.len(),
                    rate
                );
            }
        }

        let pending_probes = self.prober.pending();
        if pending_probes > 0 {
            tracing::info!("Waiting for {} external probes", pending_probes);
        }
        for (endpoint, liveness) in self.prober.collect().await {
            self.state.commit_liveness(&endpoint, liveness);
        }

        tracing::info!(
            "Crawl finished: {} items visited in {:?}",
            self.state.visited_count(),
            start_time.elapsed()
        );

        Ok(Traversal {
            state: self.state,
            cancelled,
        })
    }

    /// Processes one popped item
    ///
    /// Returns false if the item was a duplicate and was discarded.
    async fn visit(&mut self, item: Item) -> Result<bool, CrawlError> {
        let key = item.key();

        if !self.state.mark_visited(&key) {
            tracing::debug!("Skipping already visited {}", key);
            return Ok(false);
        }

        if !item.is_served_by(self.state.target()) {
            let endpoint = item.endpoint();
            let first_reference = !self.state.knows_external(&endpoint);
            self.state.record(ItemEvent::External {
                key,
                endpoint: endpoint.clone(),
            });
            if first_reference {
                self.prober.submit(endpoint);
            }
            return Ok(true);
        }

        let item_type = item.item_type();
        tracing::debug!("Visiting {} ({})", key, item_type);

        let event = match item_type {
            ItemType::Directory => match self.list(&key).await {
                Ok(listing) => {
                    self.work.extend(listing.items.into_iter().rev());
                    ItemEvent::Directory {
                        key,
                        malformed: listing.malformed,
                    }
                }
                Err(error) if key == self.root => {
                    return Err(CrawlError::RootUnreachable(error));
                }
                Err(error) => ItemEvent::Failed { error },
            },

            ItemType::TextFile => match self.fetch_text(&key).await {
                Ok(document) => ItemEvent::Text { key, document },
                Err(error) => ItemEvent::Failed { error },
            },

            ItemType::BinaryFile => match self.fetch_binary(&key).await {
                Ok(size) => ItemEvent::Binary { key, size },
                Err(error) => ItemEvent::Failed { error },
            },

            ItemType::ErrorType => ItemEvent::ErrorReference {
                key,
                display: item.display,
            },

            ItemType::UnknownType => ItemEvent::Unknown {
                key,
                indicator: item.type_indicator,
            },
        };

        self.state.record(event);
        Ok(true)
    }

    async fn list(&self, key: &VisitedKey) -> Result<Listing, ConnectionError> {
        match self.fetcher.request(key, ExpectedKind::Directory).await? {
            Response::Directory(listing) => Ok(listing),
            _ => Err(unexpected_response(key, ExpectedKind::Directory)),
        }
    }

    async fn fetch_text(&self, key: &VisitedKey) -> Result<TextDocument, ConnectionError> {
        match self.fetcher.request(key, ExpectedKind::Text).await? {
            Response::Text(document) => Ok(document),
            _ => Err(unexpected_response(key, ExpectedKind::Text)),
        }
    }

    async fn fetch_binary(&self, key: &VisitedKey) -> Result<u64, ConnectionError> {
        match self.fetcher.request(key, ExpectedKind::Binary).await? {
            Response::Binary { size } => Ok(size),
            _ => Err(unexpected_response(key, ExpectedKind::Binary)),
        }
    }
}

fn unexpected_response(key: &VisitedKey, expected: ExpectedKind) -> ConnectionError {
    ConnectionError::Io {
        key: key.clone(),
        source: io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected a {:?} response", expected),
        ),
    }
}
