//! Splitting extracted plain text into paragraphs.
//!
//! A paragraph boundary is a newline, any amount of whitespace (which may
//! contain further newlines), and another newline. The split consumes the
//! whole boundary and nothing else, so whitespace at the start or end of a
//! paragraph survives.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph boundary regex"));

/// Separator used when joining paragraphs back into a text blob.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into its paragraphs, in order.
///
/// Never returns an empty vector: empty input yields a single empty
/// paragraph.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let paragraphs: Vec<&str> = PARAGRAPH_BOUNDARY_RE.split(text).collect();
    if paragraphs.is_empty() {
        return vec![""];
    }
    paragraphs
}

pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    let mut out = String::new();
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        if idx > 0 {
            out.push_str(PARAGRAPH_SEPARATOR);
        }
        out.push_str(paragraph.as_ref());
    }
    out
}
