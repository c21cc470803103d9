//! Memoized, pooled external probing
//!
//! Probes run in the background on a bounded pool while the traversal keeps
//! going. Each endpoint owns a `OnceCell` in the cache, so two submissions
//! for the same uncached endpoint share one network attempt.

use crate::gopher::Endpoint;
use crate::probe::{Liveness, Reachability};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;

type ProbeCache = Mutex<HashMap<Endpoint, Arc<OnceCell<Liveness>>>>;

/// Probes external endpoints at most once each
pub struct ExternalProber {
    checker: Arc<dyn Reachability>,
    cache: Arc<ProbeCache>,
    workers: Arc<Semaphore>,
    pending: JoinSet<(Endpoint, Liveness)>,
}

impl ExternalProber {
    /// Creates a prober that runs at most `workers` checks at once
    pub fn new(checker: Arc<dyn Reachability>, workers: usize) -> Self {
        Self {
            checker,
            cache: Arc::new(Mutex::new(HashMap::new())),
            workers: Arc::new(Semaphore::new(workers.max(1))),
            pending: JoinSet::new(),
        }
    }

    /// Probes an endpoint and waits for the result
    ///
    /// Returns the cached result without touching the network if the
    /// endpoint has already been probed.
    pub async fn probe(&self, endpoint: &Endpoint) -> Liveness {
        resolve(&self.cache, self.checker.as_ref(), &self.workers, endpoint).await
    }

    /// Starts a background probe for an endpoint
    pub fn submit(&mut self, endpoint: Endpoint) {
        let checker = Arc::clone(&self.checker);
        let cache = Arc::clone(&self.cache);
        let workers = Arc::clone(&self.workers);

        self.pending.spawn(async move {
            let liveness = resolve(&cache, checker.as_ref(), &workers, &endpoint).await;
            (endpoint, liveness)
        });
    }

    /// Returns the cached result for an endpoint, if its probe has finished
    pub fn cached(&self, endpoint: &Endpoint) -> Option<Liveness> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(endpoint).and_then(|cell| cell.get().copied())
    }

    /// Number of submitted probes that have not been collected yet
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for every submitted probe and returns their results
    ///
    /// Results come back in completion order.
    pub async fn collect(&mut self) -> Vec<(Endpoint, Liveness)> {
        let mut results = Vec::with_capacity(self.pending.len());

        while let Some(joined) = self.pending.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::warn!("Probe task failed: {}", e),
            }
        }

        results
    }
}

impl std::fmt::Debug for ExternalProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalProber")
            .field("pending", &self.pending.len())
            .field("available_workers", &self.workers.available_permits())
            .finish()
    }
}

fn cell_for(cache: &ProbeCache, endpoint: &Endpoint) -> Arc<OnceCell<Liveness>> {
    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
    Arc::clone(cache.entry(endpoint.clone()).or_default())
}

async fn resolve(
    cache: &ProbeCache,
    checker: &dyn Reachability,
    workers: &Semaphore,
    endpoint: &Endpoint,
) -> Liveness {
    let cell = cell_for(cache, endpoint);

    let liveness = cell
        .get_or_init(|| async {
            let _permit = workers.acquire().await.ok();
            tracing::debug!("Probing external server {}", endpoint);
            checker.check(endpoint).await
        })
        .await;

    *liveness
}
