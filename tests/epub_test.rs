mod common;

use common::{EpubBuilder, assert_contiguous, nav_items, prose};
use readalong::{MemoryStore, ParseError, ParseOptions, SourceFormat, parse_epub};

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn parse(bytes: &[u8]) -> Result<readalong::StructuredDocument, ParseError> {
    parse_epub(bytes, &MemoryStore::new(), &ParseOptions::default())
}

#[test]
fn test_three_chapters_with_long_middle() {
    let long = prose(1500);
    assert!(long.chars().count() > 4320);

    let epub = EpubBuilder::new("River Book")
        .chapter("c1", "Text/ch1.xhtml", "<h1>Opening</h1>\n<p>It begins here.</p>")
        .chapter("c2", "Text/ch2.xhtml", &format!("<p>{long}</p>"))
        .chapter("c3", "Text/ch3.xhtml", "<p>It ends here.</p>")
        .nav(&[
            ("Text/ch1.xhtml", "Opening"),
            ("Text/ch2.xhtml", "The Long Middle"),
            ("Text/ch3.xhtml#end", "Closing"),
        ])
        .build();

    let doc = parse(&epub).unwrap();
    assert_eq!(doc.source_format, SourceFormat::PackagedBook);
    assert_eq!(doc.title.as_deref(), Some("River Book"));
    assert_contiguous(&doc);

    let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels[0], "Opening");
    assert_eq!(*labels.last().unwrap(), "Closing");

    let parts: Vec<&str> = labels
        .iter()
        .copied()
        .filter(|l| l.starts_with("The Long Middle — Part "))
        .collect();
    assert!(parts.len() >= 2, "{labels:?}");
    assert_eq!(parts.len() + 2, doc.sections.len());
    assert_eq!(parts[0], "The Long Middle — Part 1");
    assert_eq!(doc.sections[1].id, "chapter-2-part-1");

    // Split chapters stay one rich block.
    let rich = doc.rich_content.as_deref().unwrap();
    assert_eq!(rich.matches(r#"<section class="chapter""#).count(), 3);
    assert!(rich.contains(r#"data-section-id="chapter-2""#));

    assert!(doc.full_text.starts_with("Opening It begins here.\n\n"));
    assert!(doc.full_text.ends_with("\n\nIt ends here."));
}

#[test]
fn test_labels_from_ncx_when_no_nav() {
    let epub = EpubBuilder::new("Old Style")
        .chapter("a", "a.xhtml", "<p>First.</p>")
        .chapter("b", "b.xhtml", "<p>Second.</p>")
        .ncx(&[("a.xhtml", "Alpha"), ("b.xhtml#top", "Beta")])
        .build();

    let doc = parse(&epub).unwrap();
    let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Alpha", "Beta"]);
}

#[test]
fn test_toc_nav_wins_over_earlier_landmarks() {
    let landmarks = nav_items(&[("a.xhtml", "Start of content"), ("b.xhtml", "Back matter")]);
    let toc = nav_items(&[("a.xhtml", "Prologue"), ("b.xhtml", "Epilogue")]);
    let epub = EpubBuilder::new("Landmarks")
        .chapter("a", "a.xhtml", "<p>First.</p>")
        .chapter("b", "b.xhtml", "<p>Second.</p>")
        .nav_document(&format!(
            r#"<nav epub:type="landmarks"><ol>{landmarks}</ol></nav>
<nav epub:type="toc"><ol>{toc}</ol></nav>"#
        ))
        .build();

    let doc = parse(&epub).unwrap();
    let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Prologue", "Epilogue"]);
}

#[test]
fn test_entities_in_labels_and_title() {
    let epub = EpubBuilder::new("Pride &amp; Prejudice")
        .chapter("a", "a.xhtml", "<p>First.</p>")
        .chapter("b", "b.xhtml", "<p>Second.</p>")
        .ncx(&[("a.xhtml", "Tom &amp; Jerry"), ("b.xhtml", "Q &#38; A &lt;draft&gt;")])
        .build();

    let doc = parse(&epub).unwrap();
    assert_eq!(doc.title.as_deref(), Some("Pride & Prejudice"));
    let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Tom & Jerry", "Q & A <draft>"]);
}

#[test]
fn test_synthesized_labels_without_toc() {
    let epub = EpubBuilder::new("Bare")
        .chapter("a", "a.xhtml", "<p>First.</p>")
        .chapter("b", "b.xhtml", "<p>Second.</p>")
        .build();

    let doc = parse(&epub).unwrap();
    let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Chapter 1", "Chapter 2"]);
    assert_eq!(doc.sections[0].preview, "First.");
}

#[test]
fn test_image_only_item_keeps_numbering() {
    let epub = EpubBuilder::new("Covered")
        .chapter("cover", "cover.xhtml", r#"<img src="cover.png" alt=""/>"#)
        .chapter("one", "one.xhtml", "<p>Text.</p>")
        .resource("img", "cover.png", "image/png", PNG)
        .build();

    let store = MemoryStore::new();
    let mut doc = parse_epub(&epub, &store, &ParseOptions::default()).unwrap();

    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].id, "chapter-2");
    assert_eq!(doc.sections[0].label, "Chapter 2");
    assert_eq!(doc.full_text, "Text.");

    let rich = doc.rich_content.as_deref().unwrap();
    assert!(rich.contains(r#"data-section-id="chapter-1""#));
    assert!(rich.contains(r#"src="blob:readalong/1""#), "{rich}");

    assert_eq!(doc.resources, ["blob:readalong/1"]);
    assert_eq!(store.get("blob:readalong/1").unwrap().mime_type, "image/png");

    doc.release(&store);
    assert!(store.is_empty());
    assert!(doc.resources.is_empty());
    // Releasing again is harmless.
    doc.release(&store);
}

#[test]
fn test_shared_image_gets_one_handle() {
    let epub = EpubBuilder::new("Shared")
        .chapter("a", "Text/a.xhtml", r#"<p>A</p><img src="../Images/logo.png"/>"#)
        .chapter("b", "Text/b.xhtml", r#"<p>B</p><img src="../Images/Logo.png"/>"#)
        .resource("logo", "Images/logo.png", "image/png", PNG)
        .build();

    let store = MemoryStore::new();
    let doc = parse_epub(&epub, &store, &ParseOptions::default()).unwrap();
    assert_eq!(doc.resources.len(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_markup_is_sanitized() {
    let epub = EpubBuilder::new("Hostile")
        .chapter(
            "a",
            "a.xhtml",
            r#"<p onclick="steal()" style="color:red">Safe <a href="b.xhtml">link</a></p><script>steal()</script>"#,
        )
        .build();

    let doc = parse(&epub).unwrap();
    let rich = doc.rich_content.as_deref().unwrap();
    assert!(!rich.contains("script"));
    assert!(!rich.contains("onclick"));
    assert!(!rich.contains("style"));
    assert!(!rich.contains("stylesheet"));
    assert!(rich.contains(r##"<a href="#">link</a>"##));
    assert_eq!(doc.full_text, "Safe link");
}

#[test]
fn test_non_markup_spine_items_skipped() {
    let epub = EpubBuilder::new("Mixed")
        .spine_item("pic", "pic.png", "image/png", PNG)
        .chapter("a", "a.xhtml", "<p>Only text.</p>")
        .build();

    let doc = parse(&epub).unwrap();
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].label, "Chapter 1");
}

#[test]
fn test_drm_protected() {
    let epub = EpubBuilder::new("Locked")
        .chapter("a", "a.xhtml", "<p>Ciphertext.</p>")
        .encryption(&["http://www.w3.org/2001/04/xmlenc#aes256-cbc"])
        .build();

    assert!(matches!(parse(&epub), Err(ParseError::DrmProtected(_))));
}

#[test]
fn test_font_obfuscation_is_not_drm() {
    let epub = EpubBuilder::new("Fonts")
        .chapter("a", "a.xhtml", "<p>Readable.</p>")
        .encryption(&[
            "http://www.idpf.org/2008/embedding",
            "http://ns.adobe.com/pdf/enc#RC",
        ])
        .build();

    let doc = parse(&epub).unwrap();
    assert_eq!(doc.full_text, "Readable.");
}

#[test]
fn test_unreadable_encryption_descriptor_fails_closed() {
    let epub = EpubBuilder::new("Broken")
        .chapter("a", "a.xhtml", "<p>Text.</p>")
        .file("META-INF/encryption.xml", b"<encryption><EncryptedData></encryption>")
        .build();

    assert!(matches!(parse(&epub), Err(ParseError::DrmProtected(_))));
}

#[test]
fn test_structural_errors() {
    assert!(matches!(parse(b"not a zip"), Err(ParseError::InvalidContainer(_))));

    let no_container = EpubBuilder::new("x")
        .chapter("a", "a.xhtml", "<p>x</p>")
        .without_container()
        .build();
    assert!(matches!(parse(&no_container), Err(ParseError::InvalidContainer(_))));

    let empty_spine = EpubBuilder::new("x").build();
    assert!(matches!(parse(&empty_spine), Err(ParseError::EmptyReadingOrder)));

    let blank = EpubBuilder::new("x")
        .chapter("a", "a.xhtml", "<p>   </p>")
        .build();
    assert!(matches!(parse(&blank), Err(ParseError::EmptyContent)));
}

#[test]
fn test_missing_package_document() {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("META-INF/container.xml", options).unwrap();
    std::io::Write::write_all(
        &mut zip,
        br#"<container><rootfiles><rootfile full-path="OPS/package.opf"/></rootfiles></container>"#,
    )
    .unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    assert!(matches!(parse(&bytes), Err(ParseError::MissingPackageDocument(_))));
}
