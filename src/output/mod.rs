//! Output module for generating crawl summaries and reports
//!
//! This module handles:
//! - Freezing the crawl state into a [`StatsReport`]
//! - Printing statistics to stdout
//! - Writing markdown summaries of crawl results

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownWriter};
pub use stats::{finalize, print_statistics, ExternalServer, StatsReport};
pub use traits::{CrawlRun, OutputError, OutputResult, ReportWriter};
