//! Directory listing parser
//!
//! A listing is a sequence of CRLF (or LF) terminated records of the form
//! `<type><display>\t<selector>\t<host>\t<port>`, ended by a line holding a
//! single `.`. Malformed records are reported back to the caller instead of
//! failing the whole listing.

use crate::gopher::item::Item;

/// A parsed directory listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Well-formed items, in server order
    pub items: Vec<Item>,

    /// Lines that could not be parsed
    pub malformed: Vec<MalformedLine>,
}

/// A listing line that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// The offending line, without its line ending
    pub line: String,

    /// Why it was rejected
    pub reason: String,
}

/// Decodes listing bytes as UTF-8, falling back to ISO-8859-1
///
/// ISO-8859-1 maps every byte to the code point of the same value, so the
/// fallback never fails.
pub fn decode_listing(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parses a full listing body
///
/// Parsing stops at the terminator line; anything after it is ignored.
pub fn parse_listing(body: &str) -> Listing {
    let mut listing = Listing::default();

    for raw in body.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line == "." {
            break;
        }

        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            LineOutcome::Item(item) => listing.items.push(item),
            LineOutcome::Placeholder => {
                tracing::trace!("Dropping placeholder listing line: {}", line);
            }
            LineOutcome::Malformed(reason) => listing.malformed.push(MalformedLine {
                line: line.to_string(),
                reason,
            }),
        }
    }

    listing
}

enum LineOutcome {
    Item(Item),
    Placeholder,
    Malformed(String),
}

fn parse_line(line: &str) -> LineOutcome {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 4 {
        return LineOutcome::Malformed(format!(
            "expected at least 4 tab-separated fields, found {}",
            fields.len()
        ));
    }

    let mut head = fields[0].chars();
    let type_indicator = match head.next() {
        Some(c) => c,
        None => return LineOutcome::Malformed("missing type indicator".to_string()),
    };

    let port = match fields[3].trim().parse::<u16>() {
        Ok(0) => return LineOutcome::Placeholder,
        Ok(port) => port,
        Err(_) => {
            return LineOutcome::Malformed(format!("invalid port '{}'", fields[3].trim()));
        }
    };

    LineOutcome::Item(Item {
        type_indicator,
        display: head.as_str().trim().to_string(),
        selector: fields[1].to_string(),
        host: fields[2].trim().to_string(),
        port,
    })
}
