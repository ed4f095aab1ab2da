//! Format parsers and the [`DocumentParser`] facade.

mod docx;
pub mod epub;
mod pdf;
mod plain;
pub(crate) mod xml;

pub use docx::{DocxConverter, WordConverter, parse_word_document};
pub use epub::parse_epub;
pub use pdf::{PageSource, parse_paginated};
#[cfg(feature = "pdf")]
pub use pdf::{PdfPages, parse_pdf};
pub use plain::{parse_plain_str, parse_plain_text};

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::document::{MemoryStore, ResourceStore, SourceFormat, StructuredDocument};
use crate::error::{ParseError, Result};
use crate::options::ParseOptions;

/// Parses any supported format with one set of options and collaborators.
///
/// ```no_run
/// use readalong::DocumentParser;
///
/// let parser = DocumentParser::new();
/// let doc = parser.parse_path("book.epub")?;
/// for section in &doc.sections {
///     println!("{}: {}", section.label, section.preview);
/// }
/// # Ok::<(), readalong::ParseError>(())
/// ```
pub struct DocumentParser {
    options: ParseOptions,
    store: Arc<dyn ResourceStore>,
    converter: Box<dyn WordConverter>,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser {
    /// Default options, a [`MemoryStore`] and the built-in DOCX converter.
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            store: Arc::new(MemoryStore::new()),
            converter: Box::new(DocxConverter),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn WordConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Store image handles are created in; release documents against it.
    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Parse `bytes` as `format`.
    pub fn parse(&self, format: SourceFormat, bytes: &[u8]) -> Result<StructuredDocument> {
        debug!(?format, bytes = bytes.len(), "parsing document");
        match format {
            SourceFormat::PlainText => parse_plain_text(bytes, &self.options),
            SourceFormat::WordProcessor => {
                parse_word_document(bytes, self.converter.as_ref(), &self.options)
            }
            SourceFormat::Paginated => self.parse_paginated_bytes(bytes),
            SourceFormat::PackagedBook => parse_epub(bytes, self.store.as_ref(), &self.options),
        }
    }

    /// Read and parse a file, detecting the format from its extension, then its content.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<StructuredDocument> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = SourceFormat::from_path(path)
            .or_else(|| SourceFormat::sniff(&bytes))
            .ok_or_else(|| ParseError::UnsupportedFormat(path.display().to_string()))?;
        self.parse(format, &bytes)
    }

    #[cfg(feature = "pdf")]
    fn parse_paginated_bytes(&self, bytes: &[u8]) -> Result<StructuredDocument> {
        parse_pdf(bytes, &self.options)
    }

    #[cfg(not(feature = "pdf"))]
    fn parse_paginated_bytes(&self, _bytes: &[u8]) -> Result<StructuredDocument> {
        Err(ParseError::UnsupportedFormat(
            "PDF support is disabled (enable the `pdf` feature)".into(),
        ))
    }
}
