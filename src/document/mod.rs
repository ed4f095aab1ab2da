//! The structured document produced by every parser.

mod resources;

pub use resources::{DataUriStore, MemoryStore, ResourceStore};

use std::path::Path;

use crate::normalize;

/// Input formats understood by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SourceFormat {
    PlainText,
    WordProcessor,
    Paginated,
    PackagedBook,
}

impl SourceFormat {
    /// Guess the format from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" | "markdown" => Some(SourceFormat::PlainText),
            "docx" => Some(SourceFormat::WordProcessor),
            "pdf" => Some(SourceFormat::Paginated),
            "epub" => Some(SourceFormat::PackagedBook),
            _ => None,
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Guess the format from leading bytes.
    ///
    /// ZIP containers are told apart by the entries they are known to start with:
    /// EPUB requires a stored `mimetype` entry first, DOCX usually leads with
    /// `[Content_Types].xml` or `word/`.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(SourceFormat::Paginated);
        }
        if bytes.starts_with(b"PK\x03\x04") {
            let head = &bytes[..bytes.len().min(512)];
            if memchr::memmem::find(head, b"application/epub+zip").is_some() {
                return Some(SourceFormat::PackagedBook);
            }
            if memchr::memmem::find(head, b"[Content_Types].xml").is_some()
                || memchr::memmem::find(head, b"word/").is_some()
            {
                return Some(SourceFormat::WordProcessor);
            }
            return None;
        }
        // Text in any 8-bit encoding or UTF-8 never carries NUL bytes.
        if !bytes[..bytes.len().min(1024)].contains(&0) {
            return Some(SourceFormat::PlainText);
        }
        None
    }
}

/// A labeled span of [`StructuredDocument::full_text`].
///
/// Offsets count characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Section {
    pub id: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub preview: String,
}

impl Section {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Uniform result of parsing any supported input.
///
/// Sections are contiguous and cover `full_text` without gaps. The document owns
/// any resource handles created while rewriting embedded images; hand them back
/// with [`release`](Self::release) when the document is dropped.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructuredDocument {
    pub title: Option<String>,
    pub full_text: String,
    pub rich_content: Option<String>,
    pub sections: Vec<Section>,
    pub source_format: SourceFormat,
    /// Handles created through a [`ResourceStore`] while parsing.
    pub resources: Vec<String>,
}

impl StructuredDocument {
    /// Assemble a document from its parts, computing section previews.
    pub(crate) fn new(
        source_format: SourceFormat,
        full_text: String,
        rich_content: Option<String>,
        sections: Vec<SectionSpan>,
        preview_chars: usize,
    ) -> Self {
        let char_index = CharIndex::new(&full_text);
        let sections = sections
            .into_iter()
            .map(|span| {
                let text = &full_text[char_index.byte(span.start)..char_index.byte(span.end)];
                Section {
                    id: span.id,
                    label: span.label,
                    start: span.start,
                    end: span.end,
                    preview: normalize::preview(text, preview_chars),
                }
            })
            .collect();

        Self {
            title: None,
            full_text,
            rich_content,
            sections,
            source_format,
            resources: Vec::new(),
        }
    }

    /// Number of characters in `full_text`.
    pub fn char_len(&self) -> usize {
        self.sections.last().map(|s| s.end).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty()
    }

    /// The slice of `full_text` covered by `section`.
    pub fn section_text(&self, section: &Section) -> &str {
        let start = char_to_byte(&self.full_text, section.start);
        let end = start + char_to_byte(&self.full_text[start..], section.len());
        &self.full_text[start..end]
    }

    /// The section containing the given character offset.
    pub fn section_at(&self, offset: usize) -> Option<&Section> {
        let idx = self.sections.partition_point(|s| s.end <= offset);
        self.sections.get(idx).filter(|s| s.start <= offset)
    }

    /// Release every resource handle this document created.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn release(&mut self, store: &dyn ResourceStore) {
        for handle in self.resources.drain(..) {
            store.release(&handle);
        }
    }
}

/// A section before its preview is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SectionSpan {
    pub id: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Char offset -> byte offset table for one string.
pub(crate) struct CharIndex {
    bytes: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    /// Byte offset of the character at `char_offset`, clamped to the end.
    pub fn byte(&self, char_offset: usize) -> usize {
        self.bytes[char_offset.min(self.bytes.len() - 1)]
    }
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: &str, start: usize, end: usize) -> SectionSpan {
        SectionSpan {
            id: id.into(),
            label: id.into(),
            start,
            end,
        }
    }

    #[test]
    fn test_section_text_uses_char_offsets() {
        let doc = StructuredDocument::new(
            SourceFormat::PlainText,
            "héllo wörld".into(),
            None,
            vec![span("a", 0, 6), span("b", 6, 11)],
            160,
        );
        assert_eq!(doc.section_text(&doc.sections[0]), "héllo ");
        assert_eq!(doc.section_text(&doc.sections[1]), "wörld");
        assert_eq!(doc.sections[0].preview, "héllo");
        assert_eq!(doc.char_len(), 11);
    }

    #[test]
    fn test_section_at() {
        let doc = StructuredDocument::new(
            SourceFormat::PlainText,
            "aaaabbbb".into(),
            None,
            vec![span("a", 0, 4), span("b", 4, 8)],
            160,
        );
        assert_eq!(doc.section_at(0).map(|s| s.id.as_str()), Some("a"));
        assert_eq!(doc.section_at(4).map(|s| s.id.as_str()), Some("b"));
        assert!(doc.section_at(8).is_none());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_extension("EPUB"), Some(SourceFormat::PackagedBook));
        assert_eq!(SourceFormat::from_extension("docx"), Some(SourceFormat::WordProcessor));
        assert_eq!(SourceFormat::from_extension("xls"), None);
        assert_eq!(SourceFormat::sniff(b"%PDF-1.7\n"), Some(SourceFormat::Paginated));
        assert_eq!(SourceFormat::sniff(b"just words"), Some(SourceFormat::PlainText));
        assert_eq!(
            SourceFormat::sniff(b"PK\x03\x04....mimetypeapplication/epub+zip"),
            Some(SourceFormat::PackagedBook)
        );
    }

    #[test]
    fn test_release_drains_handles() {
        let store = MemoryStore::new();
        let mut doc = StructuredDocument::new(
            SourceFormat::PlainText,
            "x".into(),
            None,
            vec![span("a", 0, 1)],
            160,
        );
        doc.resources.push(store.create(b"abc", "image/png"));
        assert_eq!(store.len(), 1);

        doc.release(&store);
        doc.release(&store);
        assert!(doc.resources.is_empty());
        assert_eq!(store.len(), 0);
    }
}
