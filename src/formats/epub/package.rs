//! Container descriptor and package document.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ParseError, Result};
use crate::formats::xml::{attr, local_name, resolve_entity};
use crate::normalize::collapse_whitespace;
use crate::util::resolve_href;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Media types whose items are rendered as chapters.
const MARKUP_MEDIA_TYPES: &[&str] = &[
    "application/xhtml+xml",
    "text/html",
    "application/xml",
    "text/xml",
    "application/x-dtbook+xml",
];

/// Manifest entry with its href resolved to an archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub path: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    pub fn is_markup(&self) -> bool {
        let media_type = self.media_type.to_ascii_lowercase();
        MARKUP_MEDIA_TYPES.contains(&media_type.trim())
    }
}

/// Parsed package document.
#[derive(Debug, Default)]
pub struct Package {
    pub title: Option<String>,
    pub manifest: HashMap<String, ManifestItem>,
    /// Manifest ids in reading order, as listed.
    pub spine: Vec<String>,
    /// The spine's `toc` attribute.
    pub toc_id: Option<String>,
}

impl Package {
    /// Spine entries that resolve to a manifest item.
    pub fn reading_order(&self) -> Vec<&ManifestItem> {
        self.spine.iter().filter_map(|id| self.manifest.get(id)).collect()
    }

    /// Navigation document (manifest item with the `nav` property).
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest.values().find(|item| item.has_property("nav"))
    }

    /// NCX, via the spine `toc` attribute, else by media type.
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.toc_id
            .as_ref()
            .and_then(|id| self.manifest.get(id))
            .or_else(|| {
                let mut candidates: Vec<_> = self
                    .manifest
                    .values()
                    .filter(|item| item.media_type.eq_ignore_ascii_case(NCX_MEDIA_TYPE))
                    .collect();
                candidates.sort_by(|a, b| a.path.cmp(&b.path));
                candidates.into_iter().next()
            })
    }
}

/// Path of the package document named by `container.xml`.
pub fn find_package_path(container: &str) -> Result<String> {
    let mut reader = Reader::from_str(container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path").filter(|p| !p.trim().is_empty()) {
                    return Ok(path.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::InvalidContainer(format!("{CONTAINER_PATH}: {e}"))),
            _ => {}
        }
    }

    Err(ParseError::MissingPackageDocument(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse the package document stored at `path` in the archive.
pub fn parse_package(path: &str, content: &str) -> Result<Package> {
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                match local_name(e.name().as_ref()) {
                    b"metadata" => in_metadata = true,
                    b"title" if in_metadata && package.title.is_none() => {
                        in_title = true;
                        title.clear();
                    }
                    _ => {}
                }
                on_element(&mut package, path, &e);
            }
            Ok(Event::Empty(e)) => on_element(&mut package, path, &e),
            Ok(Event::Text(e)) if in_title => {
                title.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) if in_title => {
                if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref())) {
                    title.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = false,
                b"title" if in_title => {
                    in_title = false;
                    let collapsed = collapse_whitespace(&title);
                    if !collapsed.is_empty() {
                        package.title = Some(collapsed);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::MissingPackageDocument(format!("{path}: {e}")));
            }
            _ => {}
        }
    }

    Ok(package)
}

fn on_element(package: &mut Package, opf_path: &str, e: &BytesStart<'_>) {
    match local_name(e.name().as_ref()) {
        b"item" => {
            let (Some(id), Some(href)) = (attr(e, b"id"), attr(e, b"href")) else {
                return;
            };
            let item = ManifestItem {
                path: resolve_href(opf_path, &href),
                media_type: attr(e, b"media-type").unwrap_or_default(),
                properties: attr(e, b"properties")
                    .map(|p| p.split_ascii_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                id: id.clone(),
            };
            package.manifest.insert(id, item);
        }
        b"itemref" => {
            if let Some(idref) = attr(e, b"idref") {
                package.spine.push(idref);
            }
        }
        b"spine" => package.toc_id = attr(e, b"toc"),
        _ => {}
    }
}
