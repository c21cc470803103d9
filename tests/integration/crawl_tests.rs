//! Integration tests for the crawler
//!
//! These tests start an in-process Gopher server on a local TCP port and
//! run the full crawl cycle end-to-end against it.

use gopher_crawler::config::Config;
use gopher_crawler::crawler::crawl;
use gopher_crawler::output::{MarkdownWriter, ReportWriter};
use gopher_crawler::probe::Liveness;
use gopher_crawler::state::IssueKind;
use gopher_crawler::{CrawlError, Endpoint};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const HOST: &str = "127.0.0.1";

/// A minimal Gopher server answering from a fixed selector table
struct FakeGopher {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl FakeGopher {
    /// Binds a port, then builds the selector table with that port known
    async fn start(routes: impl FnOnce(u16) -> HashMap<String, Vec<u8>>) -> Self {
        let listener = TcpListener::bind((HOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(routes(port));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let mut reader = BufReader::new(socket);
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        // Liveness probes connect and close without a selector
                        return;
                    }
                    let selector = line.trim_end_matches(['\r', '\n']).to_string();
                    log.lock().unwrap().push(selector.clone());

                    let body = routes
                        .get(&selector)
                        .cloned()
                        .unwrap_or_else(|| b"3Not found\t\terror.host\t1\r\n.\r\n".to_vec());
                    let socket = reader.get_mut();
                    let _ = socket.write_all(&body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            port,
            requests,
            handle,
        }
    }

    fn requests_for(&self, selector: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == selector)
            .count()
    }

    fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for FakeGopher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Builds a directory listing; every entry is (type, display, selector, port)
fn menu(entries: &[(char, &str, &str, u16)]) -> Vec<u8> {
    let mut body = String::new();
    for (kind, display, selector, port) in entries {
        body.push_str(&format!(
            "{}{}\t{}\t{}\t{}\r\n",
            kind, display, selector, HOST, port
        ));
    }
    body.push_str(".\r\n");
    body.into_bytes()
}

fn routes(entries: Vec<(&str, Vec<u8>)>) -> HashMap<String, Vec<u8>> {
    entries
        .into_iter()
        .map(|(selector, body)| (selector.to_string(), body))
        .collect()
}

/// Creates a configuration aimed at the fake server with short timeouts
fn create_test_config(port: u16) -> Config {
    let mut config = Config::default();
    config.target.host = HOST.to_string();
    config.target.port = port;
    config.crawler.connect_timeout_ms = 1000;
    config.crawler.read_timeout_ms = 1000;
    config.crawler.probe_timeout_ms = 500;
    config
}

/// Returns a local port with nothing listening on it
async fn closed_port() -> u16 {
    let listener = TcpListener::bind((HOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn cycle_server() -> FakeGopher {
    FakeGopher::start(|port| {
        routes(vec![
            (
                "",
                menu(&[
                    ('1', "Directory A", "/dirA", port),
                    ('0', "File one", "/file1.txt", port),
                    ('9', "Blob", "/blob.bin", port),
                ]),
            ),
            ("/dirA", menu(&[('1', "Back to root", "", port)])),
            ("/file1.txt", b"hello gopher\r\n.\r\n".to_vec()),
            ("/blob.bin", vec![0xAB; 256]),
        ])
    })
    .await
}

#[tokio::test]
async fn test_full_crawl_with_cycle() {
    let server = cycle_server().await;
    let config = create_test_config(server.port);

    let (run, report) = crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(!run.cancelled);
    assert_eq!(run.target, Endpoint::new(HOST, server.port));
    assert_eq!(report.directory_count, 2);
    assert_eq!(report.text_count(), 1);
    assert_eq!(report.binary_count(), 1);
    assert_eq!(report.visited, 4);
    assert_eq!(report.failed_requests, 0);
    assert!(report.issues.is_empty());
    assert!(report.external_servers.is_empty());

    let smallest = report.smallest_text.as_ref().unwrap();
    assert_eq!(smallest.content, "hello gopher\r\n");
    assert_eq!(smallest.file.size, 14);
    assert_eq!(report.largest_binary.as_ref().unwrap().size, 256);

    // The back-reference to the root is never requested a second time
    assert_eq!(server.requests_for(""), 1);
    assert_eq!(server.total_requests(), 4);
}

#[tokio::test]
async fn test_listing_order_is_depth_first() {
    let server = FakeGopher::start(|port| {
        routes(vec![
            (
                "",
                menu(&[
                    ('1', "Sub", "/sub", port),
                    ('0', "After", "/after.txt", port),
                ]),
            ),
            ("/sub", menu(&[('0', "Inner", "/sub/inner.txt", port)])),
            ("/sub/inner.txt", b"inner".to_vec()),
            ("/after.txt", b"after".to_vec()),
        ])
    })
    .await;

    let (_, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();

    let selectors: Vec<_> = report
        .text_files
        .iter()
        .map(|file| file.key.selector.as_str())
        .collect();
    assert_eq!(selectors, vec!["/sub/inner.txt", "/after.txt"]);
}

#[tokio::test]
async fn test_equal_sizes_keep_first_encountered() {
    let server = FakeGopher::start(|port| {
        routes(vec![
            (
                "",
                menu(&[
                    ('0', "A", "/fileA", port),
                    ('0', "B", "/fileB", port),
                    ('9', "C", "/c.bin", port),
                    ('9', "D", "/d.bin", port),
                ]),
            ),
            ("/fileA", b"0123456789".to_vec()),
            ("/fileB", b"abcdefghij".to_vec()),
            ("/c.bin", vec![1; 32]),
            ("/d.bin", vec![2; 32]),
        ])
    })
    .await;

    let (_, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();

    let smallest = report.smallest_text.as_ref().unwrap();
    assert_eq!(smallest.file.key.selector, "/fileA");
    assert_eq!(smallest.content, "0123456789");
    assert_eq!(report.largest_text.as_ref().unwrap().key.selector, "/fileA");
    assert_eq!(report.smallest_binary.as_ref().unwrap().key.selector, "/c.bin");
    assert_eq!(report.largest_binary.as_ref().unwrap().key.selector, "/c.bin");
}

#[tokio::test]
async fn test_external_servers_are_probed_not_requested() {
    let other = FakeGopher::start(|_| HashMap::new()).await;
    let dead_port = closed_port().await;
    let other_port = other.port;

    let server = FakeGopher::start(move |_| {
        routes(vec![(
            "",
            menu(&[
                ('0', "Elsewhere", "/remote.txt", other_port),
                ('1', "Also elsewhere", "/menu", other_port),
                ('0', "Gone", "/gone.txt", dead_port),
            ]),
        )])
    })
    .await;

    let (_, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.external_references, 3);
    assert_eq!(report.external_servers.len(), 2);
    assert_eq!(
        report.external_servers[0].endpoint,
        Endpoint::new(HOST, other_port)
    );
    assert_eq!(report.external_servers[0].liveness, Liveness::Up);
    assert_eq!(
        report.external_servers[1].endpoint,
        Endpoint::new(HOST, dead_port)
    );
    assert_eq!(report.external_servers[1].liveness, Liveness::Down);

    assert_eq!(report.text_count(), 0);
    assert_eq!(report.directory_count, 1);
    assert_eq!(other.total_requests(), 0);
}

#[tokio::test]
async fn test_unknown_and_error_items_are_recorded() {
    let server = FakeGopher::start(|port| {
        routes(vec![(
            "",
            menu(&[
                ('7', "Search", "/search", port),
                ('3', "Broken", "/broken", port),
                ('3', "Broken again", "/broken", port),
                ('h', "Web", "URL:http://example.org", port),
            ]),
        )])
    })
    .await;

    let (_, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.unknown_items, 2);
    assert_eq!(report.unique_error_references, 1);
    assert_eq!(report.issues_of(IssueKind::UnknownType).count(), 2);
    assert_eq!(report.issues_of(IssueKind::ErrorReference).count(), 1);
    assert_eq!(report.text_count() + report.binary_count(), 0);

    // Only the root listing was requested
    assert_eq!(server.total_requests(), 1);
    assert_eq!(report.accounted_items(), report.visited as u64);
}

#[tokio::test]
async fn test_oversized_response_is_a_soft_failure() {
    let server = FakeGopher::start(|port| {
        routes(vec![
            (
                "",
                menu(&[
                    ('9', "Big", "/big.bin", port),
                    ('0', "Small", "/s.txt", port),
                ]),
            ),
            ("/big.bin", vec![0; 4096]),
            ("/s.txt", b"ok".to_vec()),
        ])
    })
    .await;

    let mut config = create_test_config(server.port);
    config.crawler.max_response_bytes = 1024;

    let (_, report) = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.failed_requests, 1);
    assert_eq!(report.binary_count(), 0);
    assert_eq!(report.text_count(), 1);
    assert_eq!(report.issues_of(IssueKind::Connection).count(), 1);
}

#[tokio::test]
async fn test_malformed_listing_lines_are_reported() {
    let server = FakeGopher::start(|port| {
        let mut root = format!("0Good\t/good.txt\t{}\t{}\r\n", HOST, port).into_bytes();
        root.extend_from_slice(b"not a gopher line\r\n");
        root.extend_from_slice(format!("0Bad port\t/x\t{}\tseventy\r\n.\r\n", HOST).as_bytes());
        routes(vec![("", root), ("/good.txt", b"good".to_vec())])
    })
    .await;

    let (_, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.text_count(), 1);
    assert_eq!(report.issues_of(IssueKind::Parse).count(), 2);
}

#[tokio::test]
async fn test_root_unreachable_is_fatal() {
    let config = create_test_config(closed_port().await);

    let result = crawl(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(CrawlError::RootUnreachable(_))));
}

#[tokio::test]
async fn test_cancelled_crawl_is_marked() {
    let server = cycle_server().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (run, report) = crawl(&create_test_config(server.port), cancel)
        .await
        .unwrap();

    assert!(run.cancelled);
    assert_eq!(run.status(), "cancelled");
    assert_eq!(report.visited, 0);
    assert_eq!(server.total_requests(), 0);
}

#[tokio::test]
async fn test_rerun_yields_equal_report() {
    let server = cycle_server().await;
    let config = create_test_config(server.port);

    let (_, first) = crawl(&config, CancellationToken::new()).await.unwrap();
    let (_, second) = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_markdown_summary_written() {
    let server = cycle_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gopher_stats.md");

    let (run, report) = crawl(&create_test_config(server.port), CancellationToken::new())
        .await
        .unwrap();
    MarkdownWriter::new(&path).write_report(&run, &report).unwrap();

    let markdown = std::fs::read_to_string(&path).unwrap();
    assert!(markdown.contains("| Directories | 2 |"));
    assert!(markdown.contains("| Text files | 1 |"));
    assert!(markdown.contains("| Binary files | 1 |"));
    assert!(markdown.contains("hello gopher"));
}
