//! Menu item and location types
//!
//! An [`Item`] is one record of a Gopher directory listing. Its location
//! ([`VisitedKey`]) is what the traverser deduplicates on, and its
//! [`Endpoint`] decides whether it belongs to the crawl target at all.

use crate::gopher::classify::{classify, ItemType};
use std::fmt;

/// A (host, port) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Creates a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The identity of a location on a Gopher server: (host, port, selector)
///
/// A given key is traversed at most once per crawl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitedKey {
    pub endpoint: Endpoint,
    pub selector: String,
}

impl VisitedKey {
    /// Creates a new key
    pub fn new(host: impl Into<String>, port: u16, selector: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(host, port),
            selector: selector.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port
    }
}

impl fmt::Display for VisitedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint, self.selector)
    }
}

/// One entry in a directory listing, or the synthetic root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Raw type indicator (first character of the listing line)
    pub type_indicator: char,

    /// Human-readable label shown in the menu
    pub display: String,

    /// Opaque selector string sent to the server
    pub selector: String,

    /// Host serving the item
    pub host: String,

    /// Port serving the item
    pub port: u16,
}

impl Item {
    /// Builds the synthetic root item for a crawl target
    ///
    /// The root is a directory with an empty selector.
    pub fn root(host: impl Into<String>, port: u16) -> Self {
        Self {
            type_indicator: '1',
            display: String::new(),
            selector: String::new(),
            host: host.into(),
            port,
        }
    }

    /// Returns the deduplication key for this item
    pub fn key(&self) -> VisitedKey {
        VisitedKey::new(self.host.clone(), self.port, self.selector.clone())
    }

    /// Returns the endpoint serving this item
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Returns true if this item is served by `endpoint`
    pub fn is_served_by(&self, endpoint: &Endpoint) -> bool {
        self.port == endpoint.port && self.host == endpoint.host
    }

    /// Classifies the item's type indicator
    pub fn item_type(&self) -> ItemType {
        classify(self.type_indicator)
    }
}
