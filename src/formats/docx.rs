//! Word-processor documents.
//!
//! Conversion to markup sits behind [`WordConverter`]; [`DocxConverter`]
//! handles the common subset of WordprocessingML (paragraph styles, bold and
//! italic runs, breaks, simple tables) straight from `word/document.xml`.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::xml::{attr, local_name, resolve_entity};
use crate::chunker::chunk_sections;
use crate::document::{SourceFormat, StructuredDocument};
use crate::error::{ParseError, Result};
use crate::markup::{block_text, escape_text, parse_html, text_content};
use crate::normalize::collapse_whitespace;
use crate::options::ParseOptions;

/// Converts word-processor bytes into markup.
pub trait WordConverter: Send + Sync {
    fn convert(&self, bytes: &[u8]) -> Result<String>;
}

/// Built-in converter for `.docx` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxConverter;

const DOCUMENT_PART: &str = "word/document.xml";

impl WordConverter for DocxConverter {
    fn convert(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut file = archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| ParseError::InvalidContainer(format!("{DOCUMENT_PART} not found")))?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        document_xml_to_html(&xml)
    }
}

/// Parse a word-processor document through `converter`.
pub fn parse_word_document(
    bytes: &[u8],
    converter: &dyn WordConverter,
    options: &ParseOptions,
) -> Result<StructuredDocument> {
    let html = converter.convert(bytes)?;
    let dom = parse_html(&html);
    let full_text = block_text(&dom, dom.body());

    let sections = chunk_sections(
        &full_text,
        options.max_section_chars,
        options.boundary_window,
        &options.word_label_prefix,
    );
    debug!(chars = full_text.len(), sections = sections.len(), "converted word document");

    let title = ["h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .find_map(|tag| dom.find_by_tag(tag))
        .map(|h| collapse_whitespace(&text_content(&dom, h)))
        .filter(|t| !t.is_empty());

    let mut doc = StructuredDocument::new(
        SourceFormat::WordProcessor,
        full_text,
        Some(html),
        sections,
        options.preview_chars,
    );
    doc.title = title;
    Ok(doc)
}

/// Block tag for a paragraph style id.
fn style_tag(style: Option<&str>) -> &'static str {
    let Some(style) = style else {
        return "p";
    };
    let normalized: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    match normalized.as_str() {
        "title" | "heading1" => "h1",
        "heading2" | "subtitle" => "h2",
        "heading3" => "h3",
        "heading4" => "h4",
        "heading5" => "h5",
        "heading6" => "h6",
        _ => "p",
    }
}

fn is_on(e: &quick_xml::events::BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0" | "false" | "none"))
}

#[derive(Default)]
struct Run {
    text: String,
    bold: bool,
    italic: bool,
}

impl Run {
    fn flush_into(&mut self, out: &mut String) {
        if self.text.is_empty() {
            return;
        }
        if self.bold {
            out.push_str("<strong>");
        }
        if self.italic {
            out.push_str("<em>");
        }
        out.push_str(&self.text);
        if self.italic {
            out.push_str("</em>");
        }
        if self.bold {
            out.push_str("</strong>");
        }
        self.text.clear();
    }
}

fn document_xml_to_html(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut html = String::new();
    let mut paragraph = String::new();
    let mut style: Option<String> = None;
    let mut run = Run::default();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    paragraph.clear();
                    style = None;
                }
                b"r" => {
                    in_run = true;
                    run = Run::default();
                }
                b"t" => in_text = true,
                b"b" if in_run => run.bold = is_on(&e),
                b"i" if in_run => run.italic = is_on(&e),
                b"tbl" => html.push_str("<table>"),
                b"tr" => html.push_str("<tr>"),
                b"tc" => html.push_str("<td>"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"pStyle" => style = attr(&e, b"val"),
                b"b" if in_run => run.bold = is_on(&e),
                b"i" if in_run => run.italic = is_on(&e),
                b"tab" if in_run => run.text.push('\t'),
                b"br" | b"cr" if in_run => {
                    run.flush_into(&mut paragraph);
                    paragraph.push_str("<br>");
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                escape_text(&String::from_utf8_lossy(e.as_ref()), &mut run.text);
            }
            Ok(Event::GeneralRef(e)) if in_text => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    escape_text(&resolved, &mut run.text);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"r" => {
                    run.flush_into(&mut paragraph);
                    in_run = false;
                }
                b"p" => {
                    if !paragraph.trim().is_empty() {
                        let tag = style_tag(style.as_deref());
                        html.push('<');
                        html.push_str(tag);
                        html.push('>');
                        html.push_str(&paragraph);
                        html.push_str("</");
                        html.push_str(tag);
                        html.push('>');
                    }
                    paragraph.clear();
                }
                b"tc" => html.push_str("</td>"),
                b"tr" => html.push_str("</tr>"),
                b"tbl" => html.push_str("</table>"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed {DOCUMENT_PART}");
                return Err(ParseError::InvalidContainer(format!("{DOCUMENT_PART}: {e}")));
            }
            _ => {}
        }
    }

    Ok(html)
}
