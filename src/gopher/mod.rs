//! Gopher protocol support
//!
//! This module contains everything the crawler knows about the wire protocol:
//! - Menu items and the keys used to deduplicate them
//! - Type indicator classification
//! - Directory listing parsing
//! - The TCP client that issues selector requests

mod classify;
mod client;
mod item;
mod listing;

pub use classify::{classify, ItemType};
pub use client::{
    ClientOptions, ConnectionError, ExpectedKind, Fetcher, GopherClient, Response, TextDocument,
    TimeoutPhase,
};
pub use item::{Endpoint, Item, VisitedKey};
pub use listing::{decode_listing, parse_listing, Listing, MalformedLine};
