//! Paginated documents.

use tracing::{debug, info};

use super::plain::paragraphs_to_html;
use crate::document::{SectionSpan, SourceFormat, StructuredDocument};
use crate::error::{ParseError, Result};
use crate::options::ParseOptions;

/// Per-page text extraction.
pub trait PageSource {
    fn page_count(&self) -> Result<usize>;

    /// Text of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// [`PageSource`] over a PDF loaded with lopdf.
#[cfg(feature = "pdf")]
pub struct PdfPages {
    document: lopdf::Document,
    pages: Vec<u32>,
}

#[cfg(feature = "pdf")]
impl PdfPages {
    /// Load a PDF from memory. Encrypted files are refused.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let document =
            lopdf::Document::load_mem(bytes).map_err(|e| ParseError::InvalidContainer(e.to_string()))?;
        if document.is_encrypted() {
            return Err(ParseError::DrmProtected("PDF is encrypted".into()));
        }
        let pages = document.get_pages().into_keys().collect();
        Ok(Self { document, pages })
    }
}

#[cfg(feature = "pdf")]
impl PageSource for PdfPages {
    fn page_count(&self) -> Result<usize> {
        Ok(self.pages.len())
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let number = *self
            .pages
            .get(index)
            .ok_or_else(|| ParseError::InvalidContainer(format!("no page at index {index}")))?;
        self.document
            .extract_text(&[number])
            .map_err(|e| ParseError::InvalidContainer(e.to_string()))
    }
}

/// Parse PDF bytes with the built-in lopdf page source.
#[cfg(feature = "pdf")]
pub fn parse_pdf(bytes: &[u8], options: &ParseOptions) -> Result<StructuredDocument> {
    parse_paginated(&PdfPages::load(bytes)?, options)
}

/// Build a document with one section per page that has text.
///
/// Blank pages get no section and contribute no text. Later pages keep their
/// physical number in ids and labels. Pages are joined by a blank line,
/// counted into the page before it.
pub fn parse_paginated(source: &dyn PageSource, options: &ParseOptions) -> Result<StructuredDocument> {
    let count = source.page_count()?;
    info!(pages = count, "extracting page text");

    let mut pages: Vec<(usize, String)> = Vec::with_capacity(count);
    for index in 0..count {
        let text = source.page_text(index)?.replace('\r', "");
        let text = text.trim();
        if text.is_empty() {
            debug!(page = index + 1, "skipping page without text");
            continue;
        }
        pages.push((index + 1, text.to_string()));
    }

    if pages.is_empty() {
        return Err(ParseError::EmptyContent);
    }

    let mut full_text = String::new();
    let mut rich = String::new();
    let mut sections = Vec::with_capacity(pages.len());
    let mut offset = 0;

    for (i, (number, text)) in pages.iter().enumerate() {
        full_text.push_str(text);
        let mut len = text.chars().count();
        if i + 1 < pages.len() {
            full_text.push_str("\n\n");
            len += 2;
        }

        sections.push(SectionSpan {
            id: format!("page-{number}"),
            label: format!("Page {number}"),
            start: offset,
            end: offset + len,
        });
        offset += len;

        rich.push_str(&format!(r#"<section class="page" data-page="{number}">"#));
        rich.push_str(&paragraphs_to_html(text));
        rich.push_str("</section>");
    }

    Ok(StructuredDocument::new(
        SourceFormat::Paginated,
        full_text,
        Some(rich),
        sections,
        options.preview_chars,
    ))
}
