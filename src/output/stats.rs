//! Statistics report generation
//!
//! This module freezes a [`CrawlState`] into an immutable [`StatsReport`]
//! and renders it to stdout.

use crate::gopher::Endpoint;
use crate::probe::Liveness;
use crate::state::{CrawlState, FileRecord, Issue, IssueKind, SmallestText};

/// An external endpoint and its probed status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalServer {
    pub endpoint: Endpoint,
    pub liveness: Liveness,
}

/// Crawl statistics summary
///
/// Built once by [`finalize`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    /// The server that was crawled
    pub target: Endpoint,

    /// Number of distinct (host, port, selector) keys visited
    pub visited: usize,

    /// Number of directories successfully listed
    pub directory_count: u64,

    /// Text files in traversal order
    pub text_files: Vec<FileRecord>,

    /// Binary files in traversal order
    pub binary_files: Vec<FileRecord>,

    /// The first text file of minimum size, with its content
    pub smallest_text: Option<SmallestText>,

    /// The first text file of maximum size
    pub largest_text: Option<FileRecord>,

    /// The first binary file of minimum size
    pub smallest_binary: Option<FileRecord>,

    /// The first binary file of maximum size
    pub largest_binary: Option<FileRecord>,

    /// Number of distinct error-type references
    pub unique_error_references: usize,

    /// External endpoints in discovery order
    pub external_servers: Vec<ExternalServer>,

    /// Number of items pointing away from the target
    pub external_references: u64,

    /// Number of items with an unhandled type indicator
    pub unknown_items: u64,

    /// Number of requests against the target that failed
    pub failed_requests: u64,

    /// Every recorded issue, in the order it occurred
    pub issues: Vec<Issue>,
}

impl StatsReport {
    pub fn text_count(&self) -> usize {
        self.text_files.len()
    }

    pub fn binary_count(&self) -> usize {
        self.binary_files.len()
    }

    /// Returns the issues of one kind
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Number of visited keys accounted for by the outcome counters
    ///
    /// Equals [`StatsReport::visited`] for every finished crawl.
    pub fn accounted_items(&self) -> u64 {
        self.directory_count
            + self.text_files.len() as u64
            + self.binary_files.len() as u64
            + self.unique_error_references as u64
            + self.unknown_items
            + self.failed_requests
            + self.external_references
    }
}

/// Freezes a crawl state into a report
///
/// External endpoints whose probe never completed are reported as down.
pub fn finalize(state: CrawlState) -> StatsReport {
    let external_servers = state
        .external
        .into_iter()
        .map(|record| ExternalServer {
            liveness: record.liveness.unwrap_or(Liveness::Down),
            endpoint: record.endpoint,
        })
        .collect();

    StatsReport {
        target: state.target,
        visited: state.visited.len(),
        directory_count: state.directories,
        text_files: state.text_files,
        binary_files: state.binary_files,
        smallest_text: state.smallest_text,
        largest_text: state.largest_text,
        smallest_binary: state.smallest_binary,
        largest_binary: state.largest_binary,
        unique_error_references: state.error_references.len(),
        external_servers,
        external_references: state.external_references,
        unknown_items: state.unknown_items,
        failed_requests: state.failed_requests,
        issues: state.issues,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The statistics to display
pub fn print_statistics(report: &StatsReport) {
    println!("=== Crawl Statistics for {} ===\n", report.target);

    println!("Overview:");
    println!("  Items visited: {}", report.visited);
    println!("  Directories: {}", report.directory_count);
    println!("  Text files: {}", report.text_count());
    println!("  Binary files: {}", report.binary_count());
    println!(
        "  Unique invalid references: {}",
        report.unique_error_references
    );
    println!("  Unknown item types: {}", report.unknown_items);
    println!("  Failed requests: {}", report.failed_requests);
    println!();

    println!("Size Extremes:");
    print_extreme(
        "Smallest text file",
        report.smallest_text.as_ref().map(|s| &s.file),
    );
    print_extreme("Largest text file", report.largest_text.as_ref());
    print_extreme("Smallest binary file", report.smallest_binary.as_ref());
    print_extreme("Largest binary file", report.largest_binary.as_ref());
    println!();

    if let Some(smallest) = &report.smallest_text {
        println!("Contents of the smallest text file:");
        println!("{}", smallest.content);
        println!();
    }

    if !report.external_servers.is_empty() {
        println!("External Servers ({}):", report.external_servers.len());
        for server in &report.external_servers {
            println!("  - {} ({})", server.endpoint, server.liveness);
        }
        println!();
    }

    if !report.issues.is_empty() {
        println!("Issues ({}):", report.issues.len());
        for kind in IssueKind::all() {
            let count = report.issues_of(kind).count();
            if count > 0 {
                println!("  {}: {}", kind, count);
            }
        }
    }
}

fn print_extreme(label: &str, file: Option<&FileRecord>) {
    match file {
        Some(file) => println!("  {}: {} ({} bytes)", label, file.key, file.size),
        None => println!("  {}: none", label),
    }
}
