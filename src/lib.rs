//! gopher-crawler: a depth-first Gopher server crawler
//!
//! This crate walks every directory reachable from a Gopher server's root,
//! fetches text and binary documents once each, probes external servers for
//! liveness, and reports statistics about what it found.

pub mod config;
pub mod crawler;
pub mod gopher;
pub mod output;
pub mod probe;
pub mod state;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Root directory unreachable: {0}")]
    RootUnreachable(gopher::ConnectionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::crawl;
pub use gopher::{classify, Endpoint, Item, ItemType, VisitedKey};
pub use output::StatsReport;
