#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::{SimpleFileOptions, ZipWriter};

const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Builds small EPUBs in memory.
#[derive(Default)]
pub struct EpubBuilder {
    title: String,
    manifest: Vec<String>,
    spine: Vec<String>,
    toc_id: Option<String>,
    files: Vec<(String, Vec<u8>)>,
    skip_container: bool,
}

pub fn xhtml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>t</title><link rel="stylesheet" href="style.css"/></head>
<body>{body}</body>
</html>"#
    )
}

impl EpubBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// A spine chapter at `OEBPS/{href}` with the given body markup.
    pub fn chapter(mut self, id: &str, href: &str, body: &str) -> Self {
        self.manifest.push(format!(
            r#"<item id="{id}" href="{href}" media-type="application/xhtml+xml"/>"#
        ));
        self.spine.push(format!(r#"<itemref idref="{id}"/>"#));
        self.files.push((format!("OEBPS/{href}"), xhtml(body).into_bytes()));
        self
    }

    /// An EPUB 3 navigation document listing `(href, label)` pairs.
    pub fn nav(self, entries: &[(&str, &str)]) -> Self {
        let toc = format!(r#"<nav epub:type="toc"><ol>{}</ol></nav>"#, nav_items(entries));
        self.nav_document(&toc)
    }

    /// A navigation document with arbitrary body markup.
    pub fn nav_document(mut self, body: &str) -> Self {
        self.manifest.push(
            r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#
                .to_string(),
        );
        self.files.push(("OEBPS/nav.xhtml".to_string(), xhtml(body).into_bytes()));
        self
    }

    /// An NCX referenced from the spine `toc` attribute.
    pub fn ncx(mut self, entries: &[(&str, &str)]) -> Self {
        let points: String = entries
            .iter()
            .enumerate()
            .map(|(i, (href, label))| {
                format!(
                    r#"<navPoint id="p{i}" playOrder="{}"><navLabel><text>{label}</text></navLabel><content src="{href}"/></navPoint>"#,
                    i + 1
                )
            })
            .collect();
        self.manifest.push(
            r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#.to_string(),
        );
        self.toc_id = Some("ncx".to_string());
        self.files.push((
            "OEBPS/toc.ncx".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1"><navMap>{points}</navMap></ncx>"#
            )
            .into_bytes(),
        ));
        self
    }

    /// A manifest item that is not in the spine, with its bytes.
    pub fn resource(mut self, id: &str, href: &str, media_type: &str, data: &[u8]) -> Self {
        self.manifest.push(format!(
            r#"<item id="{id}" href="{href}" media-type="{media_type}"/>"#
        ));
        self.files.push((format!("OEBPS/{href}"), data.to_vec()));
        self
    }

    /// A spine entry with an arbitrary media type.
    pub fn spine_item(mut self, id: &str, href: &str, media_type: &str, data: &[u8]) -> Self {
        self = self.resource(id, href, media_type, data);
        self.spine.push(format!(r#"<itemref idref="{id}"/>"#));
        self
    }

    /// A raw archive entry.
    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.push((path.to_string(), data.to_vec()));
        self
    }

    pub fn encryption(self, algorithms: &[&str]) -> Self {
        let entries: String = algorithms
            .iter()
            .enumerate()
            .map(|(i, algorithm)| {
                format!(
                    r#"<enc:EncryptedData><enc:EncryptionMethod Algorithm="{algorithm}"/><enc:CipherData><enc:CipherReference URI="OEBPS/f{i}.ttf"/></enc:CipherData></enc:EncryptedData>"#
                )
            })
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:enc="http://www.w3.org/2001/04/xmlenc#">{entries}</encryption>"#
        );
        self.file("META-INF/encryption.xml", xml.as_bytes())
    }

    pub fn without_container(mut self) -> Self {
        self.skip_container = true;
        self
    }

    pub fn package_document(&self) -> String {
        let toc = self
            .toc_id
            .as_ref()
            .map(|id| format!(r#" toc="{id}""#))
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">urn:uuid:fixture</dc:identifier>
    <dc:title>{}</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{}</manifest>
  <spine{toc}>{}</spine>
</package>"#,
            self.title,
            self.manifest.join("\n"),
            self.spine.join("\n")
        )
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        if !self.skip_container {
            zip.start_file("META-INF/container.xml", deflated).unwrap();
            zip.write_all(CONTAINER.as_bytes()).unwrap();
        }

        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.package_document().as_bytes()).unwrap();

        for (path, data) in &self.files {
            zip.start_file(path.as_str(), deflated).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

/// `<li><a>` entries for a navigation list.
pub fn nav_items(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .map(|(href, label)| format!(r#"<li><a href="{href}">{label}</a></li>"#))
        .collect()
}

/// Sections cover the text without gaps or overlap.
pub fn assert_contiguous(doc: &readalong::StructuredDocument) {
    assert!(!doc.sections.is_empty(), "at least one section");
    assert_eq!(doc.sections[0].start, 0);
    assert_eq!(doc.sections.last().unwrap().end, doc.full_text.chars().count());
    for pair in doc.sections.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "{} -> {}", pair[0].id, pair[1].id);
    }
    if doc.sections.len() > 1 {
        assert!(doc.sections.iter().all(|s| s.start < s.end));
    }
}

/// Long prose: `words` words separated by single spaces.
pub fn prose(words: usize) -> String {
    const WORDS: &[&str] = &["the", "river", "ran", "quietly", "under", "an", "old", "stone", "bridge"];
    (0..words).map(|i| WORDS[i % WORDS.len()]).collect::<Vec<_>>().join(" ")
}
