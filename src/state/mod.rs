//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the accumulator the traverser updates as it visits items
//! - `ItemEvent`: the classified outcome of visiting one item
//! - `Issue`: a soft failure recorded along the way

mod crawl_state;
mod event;
mod issue;

// Re-export main types
pub use crawl_state::{CrawlState, ExternalRecord, FileRecord, SmallestText};
pub use event::ItemEvent;
pub use issue::{Issue, IssueKind};
