//! Plain text input.

use tracing::debug;

use crate::chunker::chunk_sections;
use crate::document::{SourceFormat, StructuredDocument};
use crate::error::Result;
use crate::markup::escape_text;
use crate::options::ParseOptions;
use crate::util::decode_text;

/// Parse raw text bytes (UTF-8, falling back to Windows-1252).
pub fn parse_plain_text(bytes: &[u8], options: &ParseOptions) -> Result<StructuredDocument> {
    let text = decode_text(bytes, None);
    Ok(parse_plain_str(&text, options))
}

/// Parse text that is already decoded. Never fails.
pub fn parse_plain_str(text: &str, options: &ParseOptions) -> StructuredDocument {
    let full_text = text.strip_prefix('\u{feff}').unwrap_or(text).replace('\r', "");
    let rich = paragraphs_to_html(&full_text);

    let sections = chunk_sections(
        &full_text,
        options.max_section_chars,
        options.boundary_window,
        &options.plain_label_prefix,
    );
    debug!(sections = sections.len(), "chunked plain text");

    StructuredDocument::new(
        SourceFormat::PlainText,
        full_text,
        Some(rich),
        sections,
        options.preview_chars,
    )
}

/// One `<p>` per non-blank line.
pub(crate) fn paragraphs_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + text.len() / 8);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        html.push_str("<p>");
        escape_text(line, &mut html);
        html.push_str("</p>");
    }
    html
}
