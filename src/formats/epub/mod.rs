//! EPUB (2 and 3) books.
//!
//! The archive is inflated once, then the container descriptor leads to the
//! package document whose spine gives the reading order. Each markup item in
//! the spine is sanitized, has its images pointed at resource handles, and
//! becomes one chapter: a block of the rich rendering plus one section of plain
//! text (several when the chapter is long).
//!
//! Failures are terminal and ordered: a broken archive is
//! [`InvalidContainer`](ParseError::InvalidContainer), a missing package
//! document [`MissingPackageDocument`](ParseError::MissingPackageDocument),
//! an empty spine [`EmptyReadingOrder`](ParseError::EmptyReadingOrder), and
//! encrypted content [`DrmProtected`](ParseError::DrmProtected).

mod archive;
mod drm;
mod images;
mod nav;
mod package;

pub use archive::Archive;
pub use drm::{FONT_OBFUSCATION, check_encryption};
pub use nav::{TocLabels, nav_labels, ncx_labels};
pub use package::{ManifestItem, Package, find_package_path, parse_package};

use tracing::{debug, info, warn};

use crate::chunker::split_ranges;
use crate::document::{ResourceStore, SectionSpan, SourceFormat, StructuredDocument};
use crate::error::{ParseError, Result};
use crate::markup::{inner_html, parse_html, sanitize, text_content};
use crate::normalize::collapse_whitespace;
use crate::options::ParseOptions;
use crate::util::decode_markup;
use drm::ENCRYPTION_PATH;
use images::ImageRewriter;
use package::CONTAINER_PATH;

/// Separator between chapters in the plain text.
const CHAPTER_SEPARATOR: &str = "\n\n";

/// A spine item that produced text.
#[derive(Debug)]
struct Chapter {
    id: String,
    label: String,
    text: String,
}

/// Parse an EPUB, creating image handles through `store`.
///
/// The handles end up in [`StructuredDocument::resources`]; release them with
/// [`StructuredDocument::release`] once the document is no longer displayed.
pub fn parse_epub(
    bytes: &[u8],
    store: &dyn ResourceStore,
    options: &ParseOptions,
) -> Result<StructuredDocument> {
    let archive = Archive::inflate(bytes)?;

    let container = archive
        .text(CONTAINER_PATH)
        .ok_or_else(|| ParseError::InvalidContainer(format!("{CONTAINER_PATH} not found")))?;
    let package_path = find_package_path(&container)?;
    let package_xml = archive
        .text(&package_path)
        .ok_or_else(|| ParseError::MissingPackageDocument(format!("{package_path} not found")))?;
    let package = parse_package(&package_path, &package_xml)?;
    info!(
        package = %package_path,
        manifest = package.manifest.len(),
        spine = package.spine.len(),
        "read package document"
    );

    let reading_order = package.reading_order();
    if reading_order.is_empty() {
        return Err(ParseError::EmptyReadingOrder);
    }

    if let Some(descriptor) = archive.text(ENCRYPTION_PATH) {
        check_encryption(&descriptor)?;
    }

    let labels = toc_labels(&archive, &package);

    let mut rewriter = ImageRewriter::new(&archive, store);
    let mut rich = String::new();
    let mut chapters = Vec::new();
    let mut number = 0usize;

    for item in reading_order {
        if !item.is_markup() {
            debug!(id = %item.id, media_type = %item.media_type, "skipping non-markup spine item");
            continue;
        }
        number += 1;
        let id = format!("chapter-{number}");

        let Some(data) = archive.get(&item.path) else {
            warn!(id = %item.id, path = %item.path, "spine item missing from archive");
            continue;
        };

        let dom = sanitize(&parse_html(&decode_markup(data)));
        let dom = rewriter.rewrite(&dom, &item.path);
        let body = dom.body();

        rich.push_str(&format!(r#"<section class="chapter" data-section-id="{id}">"#));
        rich.push_str(&inner_html(&dom, body));
        rich.push_str("</section>");

        let text = collapse_whitespace(&text_content(&dom, body));
        if text.is_empty() {
            debug!(id = %item.id, "spine item has no text");
            continue;
        }

        let label = labels
            .get(&item.path.to_lowercase())
            .cloned()
            .unwrap_or_else(|| format!("Chapter {number}"));
        chapters.push(Chapter { id, label, text });
    }

    if chapters.is_empty() {
        for handle in rewriter.into_handles() {
            store.release(&handle);
        }
        return Err(ParseError::EmptyContent);
    }

    let (full_text, sections) = assemble(&chapters, options);
    info!(chapters = chapters.len(), sections = sections.len(), "parsed book");

    let mut doc = StructuredDocument::new(
        SourceFormat::PackagedBook,
        full_text,
        Some(rich),
        sections,
        options.preview_chars,
    );
    doc.title = package.title;
    doc.resources = rewriter.into_handles();
    Ok(doc)
}

/// Labels from the navigation document, falling back to the NCX.
fn toc_labels(archive: &Archive, package: &Package) -> TocLabels {
    if let Some(nav) = package.nav_item()
        && let Some(data) = archive.get(&nav.path)
    {
        let labels = nav_labels(&nav.path, &decode_markup(data));
        if !labels.is_empty() {
            debug!(entries = labels.len(), "labels from navigation document");
            return labels;
        }
    }

    if let Some(ncx) = package.ncx_item()
        && let Some(content) = archive.text(&ncx.path)
    {
        match ncx_labels(&ncx.path, &content) {
            Ok(labels) => {
                debug!(entries = labels.len(), "labels from NCX");
                return labels;
            }
            Err(e) => warn!(error = %e, "ignoring unreadable NCX"),
        }
    }

    TocLabels::new()
}

/// Join chapter texts and lay out their sections.
///
/// Chapters longer than the split threshold become word-safe parts. The
/// separator after a chapter belongs to its last section.
fn assemble(chapters: &[Chapter], options: &ParseOptions) -> (String, Vec<SectionSpan>) {
    let threshold = options.chapter_split_threshold();
    let mut full_text = String::new();
    let mut sections = Vec::new();
    let mut offset = 0;

    for (i, chapter) in chapters.iter().enumerate() {
        let chars: Vec<char> = chapter.text.chars().collect();
        let separator = if i + 1 < chapters.len() {
            CHAPTER_SEPARATOR.len()
        } else {
            0
        };

        if chars.len() > threshold {
            let parts = split_ranges(&chars, options.max_chapter_chars, options.boundary_window);
            debug!(id = %chapter.id, chars = chars.len(), parts = parts.len(), "splitting long chapter");
            let last = parts.len() - 1;
            for (k, (start, end)) in parts.into_iter().enumerate() {
                let end = if k == last { end + separator } else { end };
                sections.push(SectionSpan {
                    id: format!("{}-part-{}", chapter.id, k + 1),
                    label: format!("{} — Part {}", chapter.label, k + 1),
                    start: offset + start,
                    end: offset + end,
                });
            }
        } else {
            sections.push(SectionSpan {
                id: chapter.id.clone(),
                label: chapter.label.clone(),
                start: offset,
                end: offset + chars.len() + separator,
            });
        }

        full_text.push_str(&chapter.text);
        if separator > 0 {
            full_text.push_str(CHAPTER_SEPARATOR);
        }
        offset += chars.len() + separator;
    }

    (full_text, sections)
}
