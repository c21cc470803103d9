//! Crawl accumulator
//!
//! `CrawlState` is created when a crawl starts and owned by the traverser
//! for the crawl's lifetime. It is updated one event at a time and frozen
//! into a report by `output::finalize` once the walk is over.

use crate::gopher::{Endpoint, VisitedKey};
use crate::probe::Liveness;
use crate::state::event::ItemEvent;
use crate::state::issue::{Issue, IssueKind};
use std::collections::{HashMap, HashSet};

/// A downloaded file and its size in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub key: VisitedKey,
    pub size: u64,
}

/// The smallest text file seen so far, with its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallestText {
    pub file: FileRecord,
    pub content: String,
}

/// An external endpoint in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRecord {
    pub endpoint: Endpoint,
    /// None until the endpoint's probe result is committed
    pub liveness: Option<Liveness>,
}

/// Mutable statistics for one crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub(crate) target: Endpoint,
    pub(crate) visited: HashSet<VisitedKey>,
    pub(crate) directories: u64,
    pub(crate) text_files: Vec<FileRecord>,
    pub(crate) binary_files: Vec<FileRecord>,
    pub(crate) smallest_text: Option<SmallestText>,
    pub(crate) largest_text: Option<FileRecord>,
    pub(crate) smallest_binary: Option<FileRecord>,
    pub(crate) largest_binary: Option<FileRecord>,
    pub(crate) error_references: HashSet<VisitedKey>,
    pub(crate) external: Vec<ExternalRecord>,
    pub(crate) external_index: HashMap<Endpoint, usize>,
    pub(crate) external_references: u64,
    pub(crate) unknown_items: u64,
    pub(crate) failed_requests: u64,
    pub(crate) issues: Vec<Issue>,
}

impl CrawlState {
    /// Creates an empty state for a crawl of `target`
    pub fn new(target: Endpoint) -> Self {
        Self {
            target,
            visited: HashSet::new(),
            directories: 0,
            text_files: Vec::new(),
            binary_files: Vec::new(),
            smallest_text: None,
            largest_text: None,
            smallest_binary: None,
            largest_binary: None,
            error_references: HashSet::new(),
            external: Vec::new(),
            external_index: HashMap::new(),
            external_references: 0,
            unknown_items: 0,
            failed_requests: 0,
            issues: Vec::new(),
        }
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    /// Marks a key as visited
    ///
    /// Returns false if the key had already been visited.
    pub fn mark_visited(&mut self, key: &VisitedKey) -> bool {
        if self.visited.contains(key) {
            return false;
        }
        self.visited.insert(key.clone())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns true if `endpoint` has already been seen as an external reference
    pub fn knows_external(&self, endpoint: &Endpoint) -> bool {
        self.external_index.contains_key(endpoint)
    }

    pub fn directory_count(&self) -> u64 {
        self.directories
    }

    pub fn text_count(&self) -> usize {
        self.text_files.len()
    }

    pub fn binary_count(&self) -> usize {
        self.binary_files.len()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Applies one classified-item event
    pub fn record(&mut self, event: ItemEvent) {
        match event {
            ItemEvent::Directory { key, malformed } => {
                self.directories += 1;
                for line in malformed {
                    self.issues.push(Issue::new(
                        IssueKind::Parse,
                        key.clone(),
                        format!("{}: {:?}", line.reason, line.line),
                    ));
                }
            }

            ItemEvent::Text { key, document } => {
                let file = FileRecord {
                    key,
                    size: document.size,
                };

                let is_smallest = self
                    .smallest_text
                    .as_ref()
                    .map_or(true, |s| file.size < s.file.size);
                if is_smallest {
                    self.smallest_text = Some(SmallestText {
                        file: file.clone(),
                        content: document.content,
                    });
                }

                replace_if(&mut self.largest_text, &file, |new, old| new > old);

                tracing::info!("Processed text file: {} with size {} bytes", file.key, file.size);
                self.text_files.push(file);
            }

            ItemEvent::Binary { key, size } => {
                let file = FileRecord { key, size };
                replace_if(&mut self.smallest_binary, &file, |new, old| new < old);
                replace_if(&mut self.largest_binary, &file, |new, old| new > old);

                tracing::info!("Processed binary file: {} with size {} bytes", file.key, file.size);
                self.binary_files.push(file);
            }

            ItemEvent::External { key, endpoint } => {
                self.external_references += 1;
                if !self.external_index.contains_key(&endpoint) {
                    tracing::debug!("New external server {} referenced by {}", endpoint, key);
                    self.external_index
                        .insert(endpoint.clone(), self.external.len());
                    self.external.push(ExternalRecord {
                        endpoint,
                        liveness: None,
                    });
                }
            }

            ItemEvent::ErrorReference { key, display } => {
                if self.error_references.insert(key.clone()) {
                    self.issues.push(Issue::new(
                        IssueKind::ErrorReference,
                        key,
                        format!("Server error item: {}", display),
                    ));
                }
            }

            ItemEvent::Unknown { key, indicator } => {
                self.unknown_items += 1;
                self.issues.push(Issue::new(
                    IssueKind::UnknownType,
                    key,
                    format!("Unknown item type encountered: {:?}", indicator),
                ));
            }

            ItemEvent::Failed { error } => {
                self.failed_requests += 1;
                tracing::warn!("{}", error);
                self.issues.push(Issue::new(
                    IssueKind::Connection,
                    error.key().clone(),
                    error.to_string(),
                ));
            }
        }
    }

    /// Commits a probe result for a registered external endpoint
    ///
    /// Results for endpoints that were never registered are ignored.
    pub fn commit_liveness(&mut self, endpoint: &Endpoint, liveness: Liveness) {
        if let Some(&index) = self.external_index.get(endpoint) {
            self.external[index].liveness = Some(liveness);
        }
    }
}

/// Replaces `slot` with `candidate` when empty or when `wins(new, old)` holds
///
/// Equal sizes never win, so the first record encountered is kept.
fn replace_if(
    slot: &mut Option<FileRecord>,
    candidate: &FileRecord,
    wins: impl Fn(u64, u64) -> bool,
) {
    let replace = match slot {
        Some(current) => wins(candidate.size, current.size),
        None => true,
    };
    if replace {
        *slot = Some(candidate.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gopher::{ConnectionError, MalformedLine, TextDocument};

    fn target() -> Endpoint {
        Endpoint::new("gopher.example.org", 70)
    }

    fn key(selector: &str) -> VisitedKey {
        VisitedKey::new("gopher.example.org", 70, selector)
    }

    fn text(selector: &str, content: &str) -> ItemEvent {
        ItemEvent::Text {
            key: key(selector),
            document: TextDocument {
                content: content.to_string(),
                size: content.len() as u64,
            },
        }
    }

    #[test]
    fn test_mark_visited_once() {
        let mut state = CrawlState::new(target());
        assert!(state.mark_visited(&key("")));
        assert!(!state.mark_visited(&key("")));
        assert_eq!(state.visited_count(), 1);
    }

    #[test]
    fn test_smallest_text_tie_keeps_first() {
        let mut state = CrawlState::new(target());
        state.record(text("/fileA", "aaaaaaaaaa"));
        state.record(text("/fileB", "bbbbbbbbbb"));

        let smallest = state.smallest_text.as_ref().unwrap();
        assert_eq!(smallest.file.key, key("/fileA"));
        assert_eq!(smallest.content, "aaaaaaaaaa");

        let largest = state.largest_text.as_ref().unwrap();
        assert_eq!(largest.key, key("/fileA"));
    }

    #[test]
    fn test_text_extremes_follow_strict_comparison() {
        let mut state = CrawlState::new(target());
        state.record(text("/medium", "12345"));
        state.record(text("/small", "1"));
        state.record(text("/large", "1234567890"));
        state.record(text("/small-too", "2"));

        assert_eq!(state.text_count(), 4);
        assert_eq!(state.smallest_text.as_ref().unwrap().file.key, key("/small"));
        assert_eq!(state.smallest_text.as_ref().unwrap().content, "1");
        assert_eq!(state.largest_text.as_ref().unwrap().key, key("/large"));
    }

    #[test]
    fn test_binary_extremes() {
        let mut state = CrawlState::new(target());
        for (selector, size) in [("/a", 50), ("/b", 10), ("/c", 90), ("/d", 10), ("/e", 90)] {
            state.record(ItemEvent::Binary {
                key: key(selector),
                size,
            });
        }

        assert_eq!(state.binary_count(), 5);
        assert_eq!(state.smallest_binary.as_ref().unwrap().key, key("/b"));
        assert_eq!(state.largest_binary.as_ref().unwrap().key, key("/c"));
    }

    #[test]
    fn test_error_references_are_unique() {
        let mut state = CrawlState::new(target());
        for _ in 0..3 {
            state.record(ItemEvent::ErrorReference {
                key: key("/err"),
                display: "Not found".to_string(),
            });
        }

        assert_eq!(state.error_references.len(), 1);
        assert_eq!(state.issues().len(), 1);
        assert_eq!(state.issues()[0].kind, IssueKind::ErrorReference);
    }

    #[test]
    fn test_external_endpoints_registered_once() {
        let mut state = CrawlState::new(target());
        let other = Endpoint::new("other.example", 70);

        assert!(!state.knows_external(&other));
        state.record(ItemEvent::External {
            key: VisitedKey::new("other.example", 70, "/a"),
            endpoint: other.clone(),
        });
        state.record(ItemEvent::External {
            key: VisitedKey::new("other.example", 70, "/b"),
            endpoint: other.clone(),
        });

        assert!(state.knows_external(&other));
        assert_eq!(state.external.len(), 1);
        assert_eq!(state.external_references, 2);
        assert_eq!(state.external[0].liveness, None);

        state.commit_liveness(&other, Liveness::Up);
        assert_eq!(state.external[0].liveness, Some(Liveness::Up));

        // Unregistered endpoints are ignored
        state.commit_liveness(&Endpoint::new("nowhere", 1), Liveness::Down);
        assert_eq!(state.external.len(), 1);
    }

    #[test]
    fn test_unknown_and_failed_are_issues() {
        let mut state = CrawlState::new(target());
        state.record(ItemEvent::Unknown {
            key: key("/weird"),
            indicator: 'h',
        });
        state.record(ItemEvent::Failed {
            error: ConnectionError::Refused { key: key("/gone") },
        });

        assert_eq!(state.unknown_items, 1);
        assert_eq!(state.failed_requests, 1);
        assert_eq!(state.issues().len(), 2);
        assert_eq!(state.issues()[0].kind, IssueKind::UnknownType);
        assert_eq!(state.issues()[1].kind, IssueKind::Connection);
        assert_eq!(state.directory_count(), 0);
        assert_eq!(state.text_count(), 0);
    }

    #[test]
    fn test_directory_records_parse_issues() {
        let mut state = CrawlState::new(target());
        state.record(ItemEvent::Directory {
            key: key(""),
            malformed: vec![MalformedLine {
                line: "garbage".to_string(),
                reason: "expected at least 4 tab-separated fields, found 1".to_string(),
            }],
        });

        assert_eq!(state.directory_count(), 1);
        assert_eq!(state.issues().len(), 1);
        assert_eq!(state.issues()[0].kind, IssueKind::Parse);
        assert_eq!(state.issues()[0].location, key(""));
    }
}
