//! Classified-item events emitted by the traverser

use crate::gopher::{ConnectionError, Endpoint, MalformedLine, TextDocument, VisitedKey};

/// The outcome of visiting one item
///
/// Duplicates never produce an event; every event corresponds to exactly
/// one distinct visited key.
#[derive(Debug)]
pub enum ItemEvent {
    /// A directory on the target was listed
    Directory {
        key: VisitedKey,
        malformed: Vec<MalformedLine>,
    },

    /// A text document on the target was downloaded
    Text {
        key: VisitedKey,
        document: TextDocument,
    },

    /// A binary payload on the target was downloaded and counted
    Binary { key: VisitedKey, size: u64 },

    /// An item pointing away from the target
    External { key: VisitedKey, endpoint: Endpoint },

    /// A server-declared error item
    ErrorReference { key: VisitedKey, display: String },

    /// An item with an unhandled type indicator
    Unknown { key: VisitedKey, indicator: char },

    /// A request against the target failed
    Failed { error: ConnectionError },
}
