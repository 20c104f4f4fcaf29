//! Full-text documents and the store of documents open in the editor.
//!
//! Positions follow the LSP convention: zero-based lines and columns counted
//! in UTF-16 code units.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Url;

/// Zero-based line/column position in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range on a single line between two columns
    pub fn on_line(line: u32, start: u32, end: u32) -> Self {
        Self {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }
}

/// An open document whose content is always replaced in full
#[derive(Debug, Clone)]
pub struct TextDocument {
    uri: Url,
    version: i32,
    text: String,
    /// Byte offset at which each line starts
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(uri: Url, version: i32, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            uri,
            version,
            text,
            line_starts,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a position. Offsets past the end clamp to the end.
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character: usize = self.text[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();

        Position::new(line as u32, character as u32)
    }

    /// Convert a position into a byte offset, clamping to the line's content
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.text.len();
        }

        let line_start = self.line_starts[line];
        let content = self.line_text(position.line).unwrap_or_default();

        let mut units = 0usize;
        for (idx, ch) in content.char_indices() {
            if units >= position.character as usize {
                return line_start + idx;
            }
            units += ch.len_utf16();
        }
        line_start + content.len()
    }

    /// Content of a line without its terminator
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let line = line as usize;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());

        Some(self.text[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Range covering a byte span of the text
    pub fn range_of(&self, start: usize, end: usize) -> Range {
        Range::new(self.position_at(start), self.position_at(end))
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                starts.push(i + 2);
                i += 2;
                continue;
            }
            b'\r' | b'\n' => starts.push(i + 1),
            _ => {}
        }
        i += 1;
    }
    starts
}

/// Concurrent store of the documents currently open in the editor
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<TextDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Insert or replace a document, returning the stored snapshot
    pub fn upsert(&self, uri: Url, version: i32, text: String) -> Arc<TextDocument> {
        let document = Arc::new(TextDocument::new(uri.clone(), version, text));
        self.documents.insert(uri, Arc::clone(&document));
        document
    }

    pub fn close(&self, uri: &Url) -> Option<Arc<TextDocument>> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<TextDocument>> {
        self.documents.get(uri).map(|doc| Arc::clone(doc.value()))
    }

    /// Snapshot of every open document
    pub fn all(&self) -> Vec<Arc<TextDocument>> {
        self.documents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
