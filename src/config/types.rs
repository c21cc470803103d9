use serde::Deserialize;

/// Main configuration structure for the crawler
///
/// Every section is optional; missing values fall back to defaults and can
/// be overridden from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The server to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Hostname of the Gopher server
    #[serde(default)]
    pub host: String,

    /// Port of the Gopher server
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
        }
    }
}

/// Request behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Timeout for establishing a connection (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for each read from the server (milliseconds)
    #[serde(rename = "read-timeout-ms", default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Largest response accepted from the server, in bytes
    #[serde(rename = "max-response-bytes", default = "default_max_response_bytes")]
    pub max_response_bytes: u64,

    /// Timeout for an external liveness probe (milliseconds)
    #[serde(rename = "probe-timeout-ms", default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Maximum number of external probes running at once
    #[serde(rename = "probe-workers", default = "default_probe_workers")]
    pub probe_workers: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_workers: default_probe_workers(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,

    /// Optional file receiving a copy of the request log
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_path: default_summary_path(),
            log_path: None,
        }
    }
}

fn default_port() -> u16 {
    70
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_response_bytes() -> u64 {
    1024 * 1024
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_probe_workers() -> usize {
    8
}

fn default_summary_path() -> String {
    "gopher_stats.md".to_string()
}
