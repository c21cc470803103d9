//! Crawler module for walking a Gopher server
//!
//! This module contains the core crawling logic:
//! - The depth-first traverser with its visited set
//! - Wiring of the protocol client and external prober from configuration
//! - Freezing the accumulated state into a report

mod traverser;

pub use traverser::{Traversal, Traverser};

use crate::config::Config;
use crate::gopher::{ClientOptions, Endpoint, GopherClient};
use crate::output::{finalize, CrawlRun, StatsReport};
use crate::probe::{ExternalProber, TcpReachability};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the protocol client and external prober
/// 2. Walk the target from its root directory
/// 3. Wait for outstanding external probes
/// 4. Freeze the statistics into a report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Token that stops the walk between requests
///
/// # Returns
///
/// * `Ok((CrawlRun, StatsReport))` - Crawl completed, or was cancelled after the root listing
/// * `Err(CrawlError)` - The root directory could not be fetched
pub async fn crawl(
    config: &Config,
    cancel: CancellationToken,
) -> crate::Result<(CrawlRun, StatsReport)> {
    let target = Endpoint::new(config.target.host.clone(), config.target.port);
    let client = GopherClient::new(ClientOptions::from(&config.crawler));
    let checker = TcpReachability::new(Duration::from_millis(config.crawler.probe_timeout_ms));
    let prober = ExternalProber::new(Arc::new(checker), config.crawler.probe_workers);

    let started_at = Utc::now();
    let traversal = Traverser::new(target.clone(), client, prober)
        .with_cancellation(cancel)
        .run()
        .await?;
    let finished_at = Utc::now();

    let run = CrawlRun {
        target,
        started_at,
        finished_at,
        cancelled: traversal.cancelled,
        config_hash: None,
    };

    Ok((run, finalize(traversal.state)))
}
