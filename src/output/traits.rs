//! Output handler traits and types
//!
//! This module defines the trait interface for report writers and the run
//! metadata that accompanies a report.

use crate::gopher::Endpoint;
use crate::output::stats::StatsReport;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata about one crawl run
///
/// Kept apart from [`StatsReport`] so that two crawls of an unchanged
/// server produce equal reports.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRun {
    /// The server that was crawled
    pub target: Endpoint,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// True if the crawl was stopped before the work list was exhausted
    pub cancelled: bool,

    /// SHA-256 of the configuration file, when one was used
    pub config_hash: Option<String>,
}

impl CrawlRun {
    /// Returns the wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Returns the run status as a display string
    pub fn status(&self) -> &'static str {
        if self.cancelled {
            "cancelled"
        } else {
            "completed"
        }
    }
}

/// Trait for report writers
///
/// A writer persists a finished report somewhere; the crawl itself never
/// depends on one.
pub trait ReportWriter {
    /// Writes the report for a finished run
    ///
    /// # Arguments
    ///
    /// * `run` - Metadata about the run
    /// * `report` - The frozen statistics
    fn write_report(&self, run: &CrawlRun, report: &StatsReport) -> OutputResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_run(cancelled: bool) -> CrawlRun {
        let started_at = Utc::now();
        CrawlRun {
            target: Endpoint::new("gopher.example.org", 70),
            started_at,
            finished_at: started_at + Duration::milliseconds(2500),
            cancelled,
            config_hash: None,
        }
    }

    #[test]
    fn test_duration_seconds() {
        let run = create_test_run(false);
        assert!((run.duration_seconds() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_status() {
        assert_eq!(create_test_run(false).status(), "completed");
        assert_eq!(create_test_run(true).status(), "cancelled");
    }
}
