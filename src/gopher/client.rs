//! Gopher protocol client
//!
//! Every request opens its own TCP connection, writes the selector followed
//! by CRLF and reads the response according to the kind of item expected:
//! - directories are read line by line up to the `.` terminator and parsed
//! - text documents are read up to the same terminator, or EOF if the
//!   server closes without one
//! - binary payloads are read to EOF and only counted
//!
//! No request is ever retried. The stream is owned by the request future
//! and dropped on every exit path.

use crate::config::CrawlerConfig;
use crate::gopher::item::VisitedKey;
use crate::gopher::listing::{decode_listing, parse_listing, Listing};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// How the response to a request should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedKind {
    Directory,
    Text,
    Binary,
}

/// A text document and its size in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub content: String,
    pub size: u64,
}

/// Response to a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Directory(Listing),
    Text(TextDocument),
    /// Binary content is discarded; only its length is kept
    Binary { size: u64 },
}

/// The phase of a request that timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connect,
    Write,
    Read,
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connecting to"),
            Self::Write => write!(f, "sending request to"),
            Self::Read => write!(f, "reading from"),
        }
    }
}

/// A failed request
///
/// Every variant carries the location that was requested.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection refused by {key}")]
    Refused { key: VisitedKey },

    #[error("Timed out {phase} {key}")]
    TimedOut { key: VisitedKey, phase: TimeoutPhase },

    #[error("Connection reset by {key}")]
    Reset { key: VisitedKey },

    #[error("Response from {key} exceeded {limit} bytes")]
    TooLarge { key: VisitedKey, limit: u64 },

    #[error("I/O error talking to {key}: {source}")]
    Io { key: VisitedKey, source: io::Error },
}

impl ConnectionError {
    /// Returns the location whose request failed
    pub fn key(&self) -> &VisitedKey {
        match self {
            Self::Refused { key }
            | Self::TimedOut { key, .. }
            | Self::Reset { key }
            | Self::TooLarge { key, .. }
            | Self::Io { key, .. } => key,
        }
    }

    /// Classifies an I/O error raised while talking to `key`
    pub fn from_io(key: &VisitedKey, error: io::Error, phase: TimeoutPhase) -> Self {
        let key = key.clone();
        match error.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused { key },
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Reset { key },
            io::ErrorKind::TimedOut => Self::TimedOut { key, phase },
            _ => Self::Io { key, source: error },
        }
    }
}

/// Timeouts and limits applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            max_response_bytes: 1024 * 1024,
        }
    }
}

impl From<&CrawlerConfig> for ClientOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            max_response_bytes: config.max_response_bytes,
        }
    }
}

/// Issues selector requests against a server
///
/// The traverser only talks to the network through this trait.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Requests `key` and reads the response as `expected`
    async fn request(
        &self,
        key: &VisitedKey,
        expected: ExpectedKind,
    ) -> Result<Response, ConnectionError>;
}

/// TCP implementation of [`Fetcher`]
#[derive(Debug, Clone, Default)]
pub struct GopherClient {
    options: ClientOptions,
}

impl GopherClient {
    /// Creates a client with the given options
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    /// Connects to the item's endpoint and sends its selector
    async fn open(&self, key: &VisitedKey) -> Result<TcpStream, ConnectionError> {
        let connect = TcpStream::connect((key.host(), key.port()));
        let mut stream = match timeout(self.options.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ConnectionError::from_io(key, e, TimeoutPhase::Connect)),
            Err(_) => {
                return Err(ConnectionError::TimedOut {
                    key: key.clone(),
                    phase: TimeoutPhase::Connect,
                })
            }
        };

        let request = format!("{}\r\n", key.selector);
        match timeout(
            self.options.read_timeout,
            stream.write_all(request.as_bytes()),
        )
        .await
        {
            Ok(Ok(())) => Ok(stream),
            Ok(Err(e)) => Err(ConnectionError::from_io(key, e, TimeoutPhase::Write)),
            Err(_) => Err(ConnectionError::TimedOut {
                key: key.clone(),
                phase: TimeoutPhase::Write,
            }),
        }
    }

    /// Reads lines until a line holding only `.`, or EOF
    ///
    /// Returns the bytes before the terminator line. The connection is not
    /// read past the terminator even if the server keeps it open.
    async fn read_to_terminator<R>(
        &self,
        reader: R,
        key: &VisitedKey,
    ) -> Result<Vec<u8>, ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.options.max_response_bytes;
        let mut reader = BufReader::new(reader.take(limit + 1));
        let mut body = Vec::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = timeout(self.options.read_timeout, reader.read_until(b'\n', &mut line));
            let n = match read.await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ConnectionError::from_io(key, e, TimeoutPhase::Read)),
                Err(_) => return Err(read_timeout(key)),
            };

            if n == 0 || is_terminator_line(&line) {
                break;
            }

            body.extend_from_slice(&line);
            if body.len() as u64 > limit {
                return Err(ConnectionError::TooLarge {
                    key: key.clone(),
                    limit,
                });
            }
        }

        Ok(body)
    }

    /// Reads to EOF, counting the bytes
    async fn drain<R>(&self, mut reader: R, key: &VisitedKey) -> Result<u64, ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.options.max_response_bytes;
        let mut buf = [0u8; 8192];
        let mut total: u64 = 0;

        loop {
            let n = match timeout(self.options.read_timeout, reader.read(&mut buf)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ConnectionError::from_io(key, e, TimeoutPhase::Read)),
                Err(_) => return Err(read_timeout(key)),
            };

            if n == 0 {
                break;
            }

            total += n as u64;
            if total > limit {
                return Err(ConnectionError::TooLarge {
                    key: key.clone(),
                    limit,
                });
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl Fetcher for GopherClient {
    async fn request(
        &self,
        key: &VisitedKey,
        expected: ExpectedKind,
    ) -> Result<Response, ConnectionError> {
        tracing::info!(
            "Sending request to {}:{}: {:?} ({:?})",
            key.host(),
            key.port(),
            key.selector,
            expected
        );

        let stream = self.open(key).await?;

        let response = match expected {
            ExpectedKind::Directory => {
                let body = self.read_to_terminator(stream, key).await?;
                Response::Directory(parse_listing(&decode_listing(&body)))
            }
            ExpectedKind::Text => {
                let body = self.read_to_terminator(stream, key).await?;
                Response::Text(TextDocument {
                    size: body.len() as u64,
                    content: String::from_utf8_lossy(&body).into_owned(),
                })
            }
            ExpectedKind::Binary => Response::Binary {
                size: self.drain(stream, key).await?,
            },
        };

        match &response {
            Response::Directory(listing) => tracing::debug!(
                "Listing {} returned {} items ({} malformed)",
                key,
                listing.items.len(),
                listing.malformed.len()
            ),
            Response::Text(doc) => tracing::debug!("Text {} is {} bytes", key, doc.size),
            Response::Binary { size } => tracing::debug!("Binary {} is {} bytes", key, size),
        }

        Ok(response)
    }
}

fn read_timeout(key: &VisitedKey) -> ConnectionError {
    ConnectionError::TimedOut {
        key: key.clone(),
        phase: TimeoutPhase::Read,
    }
}

fn is_terminator_line(line: &[u8]) -> bool {
    matches!(line, b".\r\n" | b".\n" | b".")
}
