//! gopher-crawler main entry point
//!
//! This is the command-line interface for the Gopher server crawler.

use clap::Parser;
use gopher_crawler::config::{compute_config_hash, read_config, validate, Config};
use gopher_crawler::crawler::crawl;
use gopher_crawler::output::{print_statistics, MarkdownWriter, ReportWriter};
use gopher_crawler::Result;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Target of the per-request log lines written by the protocol client
const REQUEST_LOG_FILTER: &str = "gopher_crawler::gopher::client=info";

/// gopher-crawler: a depth-first Gopher server crawler
///
/// Walks every directory reachable from a server's root, fetches each
/// document once, checks external servers for liveness, and writes a
/// statistics report.
#[derive(Parser, Debug)]
#[command(name = "gopher-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A depth-first Gopher server crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Host to crawl (overrides the configuration file)
    #[arg(long)]
    host: Option<String>,

    /// Port to crawl (overrides the configuration file)
    #[arg(long)]
    port: Option<u16>,

    /// Where to write the markdown summary
    #[arg(long, value_name = "PATH")]
    summary: Option<String>,

    /// Append per-request log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, config_hash) = match resolve_config(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            // Logging is not installed yet; the configuration decides the log file
            eprintln!("{}", e);
            return Err(e.into());
        }
    };

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;

    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash).await?;
    Ok(())
}

/// Loads the configuration file, if any, applies command-line overrides and validates the result
fn resolve_config(cli: &Cli) -> Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => (read_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    if let Some(host) = &cli.host {
        config.target.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.target.port = port;
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = summary.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.output.log_path = Some(log_file.clone());
    }

    validate(&config)?;
    Ok((config, hash))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// When `log_file` is set, request lines from the protocol client are also
/// appended to that file.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_file: Option<&str>,
) -> Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gopher_crawler=info,warn"),
            1 => EnvFilter::new("gopher_crawler=debug,info"),
            2 => EnvFilter::new("gopher_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(filter);

    let requests = match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(EnvFilter::new(REQUEST_LOG_FILTER)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(requests)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== gopher-crawler Dry Run ===\n");

    println!("Target:");
    println!("  Host: {}", config.target.host);
    println!("  Port: {}", config.target.port);

    println!("\nCrawler Configuration:");
    println!("  Connect timeout: {}ms", config.crawler.connect_timeout_ms);
    println!("  Read timeout: {}ms", config.crawler.read_timeout_ms);
    println!(
        "  Max response size: {} bytes",
        config.crawler.max_response_bytes
    );
    println!("  Probe timeout: {}ms", config.crawler.probe_timeout_ms);
    println!("  Probe workers: {}", config.crawler.probe_workers);

    println!("\nOutput:");
    println!("  Summary: {}", config.output.summary_path);
    match &config.output.log_path {
        Some(path) => println!("  Request log: {}", path),
        None => println!("  Request log: disabled"),
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling gopher://{}:{}/",
        config.target.host, config.target.port
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: Option<String>) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            on_signal.cancel();
        }
    });

    let (mut run, report) = match crawl(&config, cancel).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e);
        }
    };
    run.config_hash = config_hash;

    tracing::info!(
        "Crawl {} in {:.2}s ({} items visited)",
        run.status(),
        run.duration_seconds(),
        report.visited
    );

    print_statistics(&report);

    let writer = MarkdownWriter::new(&config.output.summary_path);
    writer.write_report(&run, &report)?;
    println!("\n✓ Summary written to: {}", config.output.summary_path);

    Ok(())
}
