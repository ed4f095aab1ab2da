//! Table-of-contents labels from the navigation document or the NCX.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ParseError, Result};
use crate::formats::xml::{attr, local_name, resolve_entity};
use crate::markup::{ArenaDom, ArenaNodeId, parse_html, text_content};
use crate::normalize::collapse_whitespace;
use crate::util::resolve_href;

/// Lower-cased archive path -> label. The first label seen for a path wins.
pub type TocLabels = HashMap<String, String>;

fn insert_label(labels: &mut TocLabels, base: &str, href: &str, label: &str) {
    let label = collapse_whitespace(label);
    if label.is_empty() || href.trim().is_empty() {
        return;
    }
    let path = resolve_href(base, href).to_lowercase();
    labels.entry(path).or_insert(label);
}

/// Labels from an EPUB 3 navigation document stored at `nav_path`.
///
/// Uses the `nav` typed `toc`, or the first `nav` when none is typed.
pub fn nav_labels(nav_path: &str, content: &str) -> TocLabels {
    let dom = parse_html(content);
    let mut labels = TocLabels::new();

    let Some(nav) = toc_nav(&dom) else {
        return labels;
    };

    for node in dom.descendants(nav) {
        if dom.element_name(node).is_some_and(|n| n.as_ref() == "a")
            && let Some(href) = dom.get_attr(node, "href")
        {
            insert_label(&mut labels, nav_path, href, &text_content(&dom, node));
        }
    }
    labels
}

fn toc_nav(dom: &ArenaDom) -> Option<ArenaNodeId> {
    let navs: Vec<ArenaNodeId> = dom
        .descendants(dom.document())
        .filter(|&id| dom.element_name(id).is_some_and(|n| n.as_ref() == "nav"))
        .collect();

    navs.iter()
        .copied()
        .find(|&id| {
            dom.get_attr(id, "epub:type")
                .is_some_and(|t| t.split_ascii_whitespace().any(|t| t == "toc"))
        })
        .or_else(|| navs.first().copied())
}

/// Labels from an EPUB 2 NCX stored at `ncx_path`, in document order.
pub fn ncx_labels(ncx_path: &str, content: &str) -> Result<TocLabels> {
    // Text is not trimmed by the reader: entities arrive as separate events
    // and trimming would eat the spaces around them. `insert_label` collapses.
    let mut reader = Reader::from_str(content);

    // Label of each open navPoint.
    let mut stack: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut labels = TocLabels::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(String::new()),
                b"text" => in_text = true,
                b"content" => {
                    if let (Some(src), Some(label)) = (attr(&e, b"src"), stack.last()) {
                        insert_label(&mut labels, ncx_path, &src, label);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if local_name(e.name().as_ref()) == b"content" => {
                if let (Some(src), Some(label)) = (attr(&e, b"src"), stack.last()) {
                    insert_label(&mut labels, ncx_path, &src, label);
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(label) = stack.last_mut() {
                    label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text
                    && let Some(label) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    label.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" => {
                    stack.pop();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::InvalidContainer(format!("{ncx_path}: {e}"))),
            _ => {}
        }
    }

    Ok(labels)
}
