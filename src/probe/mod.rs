//! External endpoint liveness probing
//!
//! Items that point at a different host or port than the crawl target are
//! never requested. Instead, their endpoint is checked with a single bare TCP
//! connect, and the result is cached for the rest of the crawl.

mod prober;

pub use prober::ExternalProber;

use crate::gopher::Endpoint;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// Reachability of an external endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Liveness {
    Up,
    Down,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// A single, uncached reachability check
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn check(&self, endpoint: &Endpoint) -> Liveness;
}

/// Checks reachability with one bounded TCP connect
///
/// No protocol bytes are sent; the connection is closed as soon as it opens.
#[derive(Debug, Clone)]
pub struct TcpReachability {
    timeout: Duration,
}

impl TcpReachability {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpReachability {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl Reachability for TcpReachability {
    async fn check(&self, endpoint: &Endpoint) -> Liveness {
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => {
                tracing::debug!("External server {} is up", endpoint);
                Liveness::Up
            }
            Ok(Err(e)) => {
                tracing::info!("Failed to connect to {} - {}", endpoint, e);
                Liveness::Down
            }
            Err(_) => {
                tracing::info!("Failed to connect to {} - timed out", endpoint);
                Liveness::Down
            }
        }
    }
}
