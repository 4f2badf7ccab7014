//! Positional paragraph diff sent to the remote service.
//!
//! Paragraphs are correlated by index only. A text map entry maps the
//! original paragraph text to its replacement; the remote service replaces
//! every document paragraph whose text equals a key. As a result:
//!
//! - identical original paragraphs at different positions collapse into one
//!   key, and the last position wins ([`ParagraphChange::Superseded`]
//!   marks the edits that lose);
//! - edited paragraphs past the original paragraph count have no key to
//!   attach to and are dropped.

use std::collections::{BTreeMap, HashMap};
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::paragraphs::split_paragraphs;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextMap {
    entries: BTreeMap<String, String>,
}

impl TextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// JSON object form used for the `text_map` form field.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    fn record(&mut self, original: &str, edited: &str) {
        self.entries.insert(original.to_string(), edited.to_string());
    }
}

impl<'a> IntoIterator for &'a TextMap {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the map of changed paragraphs between `original` and `edited`.
pub fn build_text_map(original: &str, edited: &str) -> TextMap {
    let original_paragraphs = split_paragraphs(original);
    let edited_paragraphs = split_paragraphs(edited);

    let mut map = TextMap::new();
    for (idx, original_paragraph) in original_paragraphs.iter().enumerate() {
        let Some(edited_paragraph) = edited_paragraphs.get(idx) else {
            continue;
        };
        if original_paragraph != edited_paragraph {
            map.record(original_paragraph, edited_paragraph);
        }
    }
    map
}

/// How one edited paragraph relates to the original at the same position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphChange {
    Unchanged,
    /// Differs from the original paragraph; its text map entry is sent.
    Modified,
    /// Differs from the original, but a later paragraph with the same
    /// original text overwrites its entry, so this edit is never sent.
    Superseded,
    /// Past the last original paragraph; never sent.
    Dropped,
}

/// Classify every edited paragraph, in order.
///
/// Exactly one `Modified` index exists per [`build_text_map`] entry: the
/// last position writing that key. Earlier writers are `Superseded`.
pub fn paragraph_changes(original: &str, edited: &str) -> Vec<ParagraphChange> {
    let original_paragraphs = split_paragraphs(original);
    let edited_paragraphs = split_paragraphs(edited);

    let mut last_writer: HashMap<&str, usize> = HashMap::new();
    for (idx, (original_paragraph, edited_paragraph)) in original_paragraphs
        .iter()
        .zip(edited_paragraphs.iter())
        .enumerate()
    {
        if original_paragraph != edited_paragraph {
            last_writer.insert(*original_paragraph, idx);
        }
    }

    edited_paragraphs
        .iter()
        .enumerate()
        .map(|(idx, edited_paragraph)| match original_paragraphs.get(idx) {
            None => ParagraphChange::Dropped,
            Some(original_paragraph) if original_paragraph == edited_paragraph => {
                ParagraphChange::Unchanged
            }
            Some(original_paragraph) if last_writer.get(original_paragraph) == Some(&idx) => {
                ParagraphChange::Modified
            }
            Some(_) => ParagraphChange::Superseded,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub modified: usize,
    pub superseded: usize,
    pub dropped: usize,
}

impl ChangeSummary {
    /// Edits the user made that will not reach the document.
    pub fn lost(&self) -> usize {
        self.superseded + self.dropped
    }
}

pub fn summarize_changes(changes: &[ParagraphChange]) -> ChangeSummary {
    changes
        .iter()
        .fold(ChangeSummary::default(), |mut summary, change| {
            match change {
                ParagraphChange::Modified => summary.modified += 1,
                ParagraphChange::Superseded => summary.superseded += 1,
                ParagraphChange::Dropped => summary.dropped += 1,
                ParagraphChange::Unchanged => {}
            }
            summary
        })
}

#[cfg(test)]
#[path = "text_map_tests.rs"]
mod text_map_tests;
