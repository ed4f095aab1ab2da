//! Byte decoding, media type sniffing and archive path helpers.

use std::borrow::Cow;

use encoding_rs::Encoding;
use memchr::memmem;
use percent_encoding::percent_decode_str;

/// Decode text whose encoding is not known for sure.
///
/// Valid UTF-8 (with or without a BOM) is borrowed as is. Otherwise the
/// `declared` label is tried, then Windows-1252, which never fails and covers
/// most legacy files.
pub fn decode_text<'a>(bytes: &'a [u8], declared: Option<&str>) -> Cow<'a, str> {
    if let Some(utf8) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(strip_bom(bytes)) {
        return utf8;
    }

    let fallback = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::WINDOWS_1252);
    fallback.decode(bytes).0
}

/// Decode an XML or XHTML document, honouring its declared encoding.
pub fn decode_markup(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

/// The `encoding` pseudo-attribute of an XML declaration near the start of
/// `bytes`.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(XML_DECLARATION_WINDOW)];
    let decl = &head[memmem::find(head, b"<?xml")?..];
    let decl = &decl[..memmem::find(decl, b"?>").unwrap_or(decl.len())];

    let value = &decl[memmem::find(decl, b"encoding")? + b"encoding".len()..];
    let value = value.trim_ascii_start().strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = value.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label = &rest[..memchr::memchr(quote, rest)?];
    std::str::from_utf8(label).ok()
}

const XML_DECLARATION_WINDOW: usize = 128;

/// Image formats that can be embedded in a rich rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    Avif,
    Bmp,
    /// Anything not recognised; served as opaque bytes.
    Binary,
}

impl MediaFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Bmp => "image/bmp",
            Self::Binary => "application/octet-stream",
        }
    }

    fn from_extension(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        Some(match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "svg" | "svgz" => Self::Svg,
            "webp" => Self::WebP,
            "avif" => Self::Avif,
            "bmp" => Self::Bmp,
            _ => return None,
        })
    }

    fn sniff(data: &[u8]) -> Option<Self> {
        const SIGNATURES: &[(&[u8], MediaFormat)] = &[
            (&[0xFF, 0xD8, 0xFF], MediaFormat::Jpeg),
            (b"\x89PNG", MediaFormat::Png),
            (b"GIF8", MediaFormat::Gif),
            (b"BM", MediaFormat::Bmp),
        ];
        if let Some((_, format)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
            return Some(*format);
        }
        match data.get(..12)? {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P'] => Some(Self::WebP),
            [_, _, _, _, b'f', b't', b'y', b'p', b'a', b'v', b'i', b's' | b'f'] => Some(Self::Avif),
            _ => None,
        }
    }
}

/// Work out an image format from its archive path, falling back to the
/// leading bytes when the extension says nothing.
pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    MediaFormat::from_extension(path)
        .or_else(|| MediaFormat::sniff(data))
        .unwrap_or(MediaFormat::Binary)
}

/// `data` without a leading UTF-8 byte order mark.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Whether a reference points outside the archive (or embeds its own bytes).
pub fn is_external_reference(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("data:")
        || lower.starts_with("//")
        || lower.starts_with("javascript:")
        || lower.contains("://")
        || lower.starts_with("mailto:")
}

/// Resolve an archive-relative reference against the path of the file containing it.
///
/// Fragments and query strings are dropped, percent escapes decoded and `.`/`..`
/// segments collapsed. A leading `/` anchors at the archive root.
///
/// ```ignore
/// assert_eq!(resolve_href("OEBPS/text/ch1.xhtml", "../images/a.png"), "OEBPS/images/a.png");
/// ```
pub fn resolve_href(base_file: &str, href: &str) -> String {
    let href = href.split(['#', '?']).next().unwrap_or_default();
    let href = percent_decode_str(href).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    if !href.starts_with('/') {
        segments.extend(base_file.split('/'));
        // Drop the file name of the base.
        segments.pop();
    }

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.retain(|s| !s.is_empty());
    segments.join("/")
}
