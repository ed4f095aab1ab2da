//! # readalong
//!
//! Turns documents (plain text, DOCX, PDF, EPUB) into a uniform
//! [`StructuredDocument`] and follows a growing reference text through the
//! document's rich rendering.
//!
//! ## Features
//!
//! - Plain text and word-processor documents chunked into word-safe sections
//! - PDF pages as sections (with the `pdf` feature, on by default)
//! - EPUB 2/3 with sanitized chapter markup, embedded images, navigation
//!   labels and DRM detection
//! - Progressive alignment of transcript text onto the rendering
//!
//! ## Quick Start
//!
//! ```no_run
//! use readalong::DocumentParser;
//!
//! let parser = DocumentParser::new();
//! let mut doc = parser.parse_path("book.epub")?;
//! println!("{} sections", doc.sections.len());
//!
//! // Image handles live until the document is released.
//! doc.release(parser.store().as_ref());
//! # Ok::<(), readalong::ParseError>(())
//! ```
//!
//! ## Following a reference text
//!
//! ```
//! use readalong::{ProgressiveAligner, parse_plain_str, ParseOptions};
//!
//! let doc = parse_plain_str("Hello world.\nSecond line.", &ParseOptions::default());
//! let mut aligner = ProgressiveAligner::from_markup(doc.rich_content.as_deref().unwrap_or(""));
//!
//! let fragment = aligner.slice_by_reference("hello wor");
//! assert_eq!(fragment.markup, "<p>Hello wor</p>");
//! let fragment = aligner.slice_by_reference("Hello, world. Second");
//! assert_eq!(fragment.markup, "<p>Hello world.</p><p>Second</p>");
//! ```

pub mod align;
pub mod chunker;
pub mod document;
pub mod error;
pub mod formats;
pub mod markup;
pub mod normalize;
pub mod options;
pub(crate) mod util;

pub use align::{AlignmentIndex, Fragment, ProgressiveAligner};
pub use document::{DataUriStore, MemoryStore, ResourceStore, Section, SourceFormat, StructuredDocument};
pub use error::{ParseError, Result};
pub use formats::{
    DocumentParser, DocxConverter, PageSource, WordConverter, parse_epub, parse_paginated,
    parse_plain_str, parse_plain_text, parse_word_document,
};
#[cfg(feature = "pdf")]
pub use formats::{PdfPages, parse_pdf};
pub use options::ParseOptions;
