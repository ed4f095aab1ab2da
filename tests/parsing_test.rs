mod common;

use std::io::{Cursor, Write};

use common::{EpubBuilder, assert_contiguous, prose};
use readalong::{
    DocumentParser, PageSource, ParseError, ParseOptions, SourceFormat, parse_paginated,
    parse_plain_text,
};
use tempfile::NamedTempFile;
use zip::write::{SimpleFileOptions, ZipWriter};

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

struct Pages(Vec<String>);

impl PageSource for Pages {
    fn page_count(&self) -> readalong::Result<usize> {
        Ok(self.0.len())
    }

    fn page_text(&self, index: usize) -> readalong::Result<String> {
        Ok(self.0[index].clone())
    }
}

#[test]
fn test_sections_contiguous_for_every_format() {
    let options = ParseOptions::default();

    let plain = parse_plain_text(prose(2000).as_bytes(), &options).unwrap();
    assert!(plain.sections.len() > 1);
    assert_contiguous(&plain);

    let long = prose(600);
    let word = DocumentParser::new()
        .parse(SourceFormat::WordProcessor, &docx(&[&long, &long, "The end."]))
        .unwrap();
    assert!(word.sections.len() > 1);
    assert!(word.sections.iter().all(|s| s.label.starts_with("Section ")));
    assert_contiguous(&word);

    let paged = parse_paginated(&Pages(vec![prose(50), String::new(), prose(80)]), &options).unwrap();
    assert_eq!(paged.sections.len(), 2);
    assert_contiguous(&paged);

    let book = EpubBuilder::new("b")
        .chapter("a", "a.xhtml", &format!("<p>{}</p>", prose(1200)))
        .chapter("b", "b.xhtml", "<p>Short.</p>")
        .build();
    let book = DocumentParser::new().parse(SourceFormat::PackagedBook, &book).unwrap();
    assert!(book.sections.len() > 2);
    assert_contiguous(&book);
}

#[test]
fn test_sections_never_cut_words() {
    let doc = parse_plain_text(prose(3000).as_bytes(), &ParseOptions::default()).unwrap();
    for section in &doc.sections[..doc.sections.len() - 1] {
        let text = doc.section_text(section);
        assert!(text.ends_with(' '), "section {} ends mid-word: {text:?}", section.id);
    }
}

#[test]
fn test_section_lookup() {
    let doc = parse_plain_text(prose(1000).as_bytes(), &ParseOptions::default()).unwrap();
    let second = &doc.sections[1];
    assert_eq!(doc.section_at(second.start).map(|s| s.id.as_str()), Some(second.id.as_str()));
    assert_eq!(doc.section_at(second.start - 1).map(|s| s.id.as_str()), Some(doc.sections[0].id.as_str()));
    assert!(doc.section_at(doc.char_len()).is_none());
}

#[test]
fn test_parse_path_by_extension() {
    let mut file = NamedTempFile::with_suffix(".txt").unwrap();
    file.write_all(b"Just some notes.\r\nSecond line.").unwrap();

    let doc = DocumentParser::new().parse_path(file.path()).unwrap();
    assert_eq!(doc.source_format, SourceFormat::PlainText);
    assert_eq!(doc.full_text, "Just some notes.\nSecond line.");
}

#[test]
fn test_parse_path_sniffs_content() {
    let mut file = NamedTempFile::with_suffix(".bin").unwrap();
    file.write_all(&EpubBuilder::new("Sniffed").chapter("a", "a.xhtml", "<p>Hi.</p>").build())
        .unwrap();

    let doc = DocumentParser::new().parse_path(file.path()).unwrap();
    assert_eq!(doc.source_format, SourceFormat::PackagedBook);
    assert_eq!(doc.title.as_deref(), Some("Sniffed"));

    let mut file = NamedTempFile::with_suffix(".bin").unwrap();
    file.write_all(&docx(&["Memo"])).unwrap();
    let doc = DocumentParser::new().parse_path(file.path()).unwrap();
    assert_eq!(doc.source_format, SourceFormat::WordProcessor);
}

#[test]
fn test_parse_path_errors() {
    let mut file = NamedTempFile::with_suffix(".bin").unwrap();
    file.write_all(&[0, 1, 2, 3, 0, 0]).unwrap();
    assert!(matches!(
        DocumentParser::new().parse_path(file.path()),
        Err(ParseError::UnsupportedFormat(_))
    ));

    assert!(matches!(
        DocumentParser::new().parse_path("/nonexistent/readalong/file.txt"),
        Err(ParseError::Io(_))
    ));
}

#[test]
fn test_format_detection() {
    assert_eq!(SourceFormat::from_extension("EPUB"), Some(SourceFormat::PackagedBook));
    assert_eq!(SourceFormat::from_extension("docx"), Some(SourceFormat::WordProcessor));
    assert_eq!(SourceFormat::from_extension("pdf"), Some(SourceFormat::Paginated));
    assert_eq!(SourceFormat::from_extension("md"), Some(SourceFormat::PlainText));
    assert_eq!(SourceFormat::from_extension("mobi"), None);
    assert_eq!(SourceFormat::sniff(b"%PDF-1.7\n"), Some(SourceFormat::Paginated));
}

#[test]
fn test_paginated_empty_is_error() {
    let err = parse_paginated(&Pages(vec!["   ".into()]), &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::EmptyContent));
}
