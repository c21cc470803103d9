//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including counts, size extremes, external servers and recorded issues.

use crate::output::stats::StatsReport;
use crate::output::traits::{CrawlRun, OutputResult, ReportWriter};
use crate::state::{FileRecord, IssueKind};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File lists longer than this are truncated in the summary
const MAX_LISTED_FILES: usize = 50;

/// Writes markdown summaries to a fixed path
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    path: PathBuf,
}

impl MarkdownWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for MarkdownWriter {
    fn write_report(&self, run: &CrawlRun, report: &StatsReport) -> OutputResult<()> {
        generate_markdown_summary(run, report, &self.path)
    }
}

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `run` - Metadata about the run
/// * `report` - The crawl statistics
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    run: &CrawlRun,
    report: &StatsReport,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(run, report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(run: &CrawlRun, report: &StatsReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Gopher Crawl Summary for {}\n\n", report.target));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", run.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", run.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        run.duration_seconds()
    ));
    md.push_str(&format!("- **Status**: {}\n", run.status()));
    if let Some(hash) = &run.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Counts
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Items visited | {} |\n", report.visited));
    md.push_str(&format!("| Directories | {} |\n", report.directory_count));
    md.push_str(&format!("| Text files | {} |\n", report.text_count()));
    md.push_str(&format!("| Binary files | {} |\n", report.binary_count()));
    md.push_str(&format!(
        "| Unique invalid references | {} |\n",
        report.unique_error_references
    ));
    md.push_str(&format!(
        "| External references | {} |\n",
        report.external_references
    ));
    md.push_str(&format!("| Unknown item types | {} |\n", report.unknown_items));
    md.push_str(&format!("| Failed requests | {} |\n\n", report.failed_requests));

    push_file_list(&mut md, "Text Files", &report.text_files);
    push_file_list(&mut md, "Binary Files", &report.binary_files);

    // Size extremes
    md.push_str("## Size Extremes\n\n");
    md.push_str("| Category | Item | Size (bytes) |\n");
    md.push_str("|----------|------|--------------|\n");
    push_extreme_row(
        &mut md,
        "Smallest text",
        report.smallest_text.as_ref().map(|s| &s.file),
    );
    push_extreme_row(&mut md, "Largest text", report.largest_text.as_ref());
    push_extreme_row(&mut md, "Smallest binary", report.smallest_binary.as_ref());
    push_extreme_row(&mut md, "Largest binary", report.largest_binary.as_ref());
    md.push('\n');

    if let Some(smallest) = &report.smallest_text {
        md.push_str("## Smallest Text File Contents\n\n");
        md.push_str("```\n");
        md.push_str(&smallest.content);
        if !smallest.content.ends_with('\n') {
            md.push('\n');
        }
        md.push_str("```\n\n");
    }

    // External servers
    if !report.external_servers.is_empty() {
        md.push_str("## External Servers\n\n");
        md.push_str("| Server | Status |\n");
        md.push_str("|--------|--------|\n");
        for server in &report.external_servers {
            md.push_str(&format!("| {} | {} |\n", server.endpoint, server.liveness));
        }
        md.push('\n');
    }

    // Issues, grouped by kind
    if !report.issues.is_empty() {
        md.push_str("## Issues\n\n");
        for kind in IssueKind::all() {
            let issues: Vec<_> = report.issues_of(kind).collect();
            if issues.is_empty() {
                continue;
            }

            md.push_str(&format!("### {} ({})\n\n", heading_for(kind), issues.len()));
            for issue in issues {
                md.push_str(&format!("- `{}`: {}\n", issue.location, issue.detail));
            }
            md.push('\n');
        }
    }

    md
}

fn heading_for(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Connection => "Connection Errors",
        IssueKind::Parse => "Malformed Listing Lines",
        IssueKind::UnknownType => "Unknown Item Types",
        IssueKind::ErrorReference => "Invalid References",
    }
}

fn push_file_list(md: &mut String, title: &str, files: &[FileRecord]) {
    if files.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    for file in files.iter().take(MAX_LISTED_FILES) {
        md.push_str(&format!("- `{}` ({} bytes)\n", file.key, file.size));
    }
    if files.len() > MAX_LISTED_FILES {
        md.push_str(&format!(
            "\n... and {} more\n\n",
            files.len() - MAX_LISTED_FILES
        ));
    } else {
        md.push('\n');
    }
}

fn push_extreme_row(md: &mut String, label: &str, file: Option<&FileRecord>) {
    match file {
        Some(file) => md.push_str(&format!("| {} | `{}` | {} |\n", label, file.key, file.size)),
        None => md.push_str(&format!("| {} | - | - |\n", label)),
    }
}
