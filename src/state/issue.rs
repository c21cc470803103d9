//! Soft failures recorded during a crawl

use crate::gopher::VisitedKey;
use std::fmt;

/// Category of a recorded issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    /// Request failed: refused, timed out, reset, oversized or other I/O error
    Connection,

    /// A directory listing contained a malformed line
    Parse,

    /// An item carried a type indicator the crawler does not handle
    UnknownType,

    /// The server listed an error-type item
    ErrorReference,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Parse => "parse",
            Self::UnknownType => "unknown_type",
            Self::ErrorReference => "error_reference",
        }
    }

    /// Returns all issue kinds in report order
    pub fn all() -> [Self; 4] {
        [
            Self::Connection,
            Self::Parse,
            Self::UnknownType,
            Self::ErrorReference,
        ]
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,

    /// The item the issue is about; for parse issues, the listing it came from
    pub location: VisitedKey,

    /// Human-readable description
    pub detail: String,
}

impl Issue {
    pub fn new(kind: IssueKind, location: VisitedKey, detail: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.detail)
    }
}
