//! Line index for editor gutter and cursor sync.
//!
//! Built with a single forward scan over the raw text. It never invokes the
//! tokenizer or parser, so it stays fast on documents with tens of thousands
//! of lines and still works on documents that do not parse.

use crate::escape::decode_lossy;
use crate::wire;
use serde::{Deserialize, Serialize};

/// Leaf tag indexed by default: the function name
pub const DEFAULT_INDEX_TAG: &str = wire::BASE_FUNCTION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEntry {
    /// Decoded text content of the tag
    pub name: String,
    /// 1-based line number
    pub line: usize,
    /// 0-based column of the opening `<`, in characters
    pub column: usize,
    /// Character offset of the opening `<` from the start of the document
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    tag: String,
    entries: Vec<LineEntry>,
}

impl LineIndex {
    pub fn build(text: &str) -> Self {
        Self::build_for_tag(text, DEFAULT_INDEX_TAG)
    }

    /// Index every `<tag>name</tag>` occurrence that opens and closes on one line
    pub fn build_for_tag(text: &str, tag: &str) -> Self {
        let text = text.strip_prefix(wire::BYTE_ORDER_MARK).unwrap_or(text);
        let open = format!("<{}>", tag);
        let close = format!("</{}>", tag);
        let mut entries = Vec::new();
        let mut line_offset = 0;

        for (i, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let mut search_from = 0;

            while let Some(found) = line[search_from..].find(&open) {
                let start = search_from + found;
                let content_start = start + open.len();
                let Some(len) = line[content_start..].find(&close) else {
                    break;
                };

                let column = line[..start].chars().count();
                entries.push(LineEntry {
                    name: decode_lossy(&line[content_start..content_start + len]).into_owned(),
                    line: i + 1,
                    column,
                    offset: line_offset + column,
                });
                search_from = content_start + len + close.len();
            }

            // +1 for the '\n' consumed by split
            line_offset += raw_line.chars().count() + 1;
        }

        Self {
            tag: tag.to_string(),
            entries,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry on `line`, by binary search over the line-sorted entries
    pub fn find_by_line(&self, line: usize) -> Option<&LineEntry> {
        let idx = self.entries.partition_point(|e| e.line < line);
        self.entries.get(idx).filter(|e| e.line == line)
    }

    pub fn is_indexed_line(&self, line: usize) -> bool {
        self.find_by_line(line).is_some()
    }

    /// Case-insensitive substring match on entry names; a blank term matches all
    pub fn search_by_name(&self, term: &str) -> Vec<&LineEntry> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect()
    }
}

pub fn build_line_index(text: &str) -> LineIndex {
    LineIndex::build(text)
}

pub fn find_by_line(index: &LineIndex, line: usize) -> Option<&LineEntry> {
    index.find_by_line(line)
}

pub fn is_indexed_line(index: &LineIndex, line: usize) -> bool {
    index.is_indexed_line(line)
}

pub fn search_by_name<'a>(index: &'a LineIndex, term: &str) -> Vec<&'a LineEntry> {
    index.search_by_name(term)
}
