//! Item type classification
//!
//! Maps a Gopher type indicator to the category the crawler acts on.

use std::fmt;

/// Semantic category of a menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Menu that is expanded with a listing request (`1`)
    Directory,

    /// Plain text document (`0`)
    TextFile,

    /// Binary payload (`9` and the binary subvariants `4`, `5`, `6`, `g`, `I`)
    BinaryFile,

    /// Server-declared error record (`3`)
    ErrorType,

    /// Anything else, including informational lines (`i`)
    UnknownType,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::TextFile => "text",
            Self::BinaryFile => "binary",
            Self::ErrorType => "error",
            Self::UnknownType => "unknown",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a type indicator
///
/// Total over `char`: every indicator outside the known set maps to
/// [`ItemType::UnknownType`].
pub fn classify(indicator: char) -> ItemType {
    match indicator {
        '1' => ItemType::Directory,
        '0' => ItemType::TextFile,
        '9' | '4' | '5' | '6' | 'g' | 'I' => ItemType::BinaryFile,
        '3' => ItemType::ErrorType,
        _ => ItemType::UnknownType,
    }
}
