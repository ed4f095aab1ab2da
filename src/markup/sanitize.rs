//! Strip active content from untrusted markup.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute};

/// Elements removed together with everything inside them.
const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "form",
    "input", "button", "select", "textarea", "link", "meta", "base", "noscript", "template",
    "audio", "video",
];

/// Produce a sanitized copy of `dom`.
///
/// Scripting, styling, embedding and interactive elements are dropped with their
/// content. Event handlers, inline styles and `javascript:` URLs are stripped from
/// the remaining elements, and hyperlinks are made inert.
pub fn sanitize(dom: &ArenaDom) -> ArenaDom {
    dom.map_tree(|src, id| sanitize_node(src, id))
}

fn sanitize_node(dom: &ArenaDom, id: ArenaNodeId) -> Option<ArenaNodeData> {
    let node = dom.get(id)?;
    match &node.data {
        ArenaNodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            if REMOVED_ELEMENTS.contains(&tag) {
                return None;
            }
            let mut attrs: Vec<Attribute> =
                attrs.iter().filter(|a| keep_attribute(a)).cloned().collect();
            if tag == "a" {
                neutralize_link(&mut attrs);
            }
            Some(ArenaNodeData::Element {
                name: name.clone(),
                attrs,
            })
        }
        ArenaNodeData::Comment(_) => None,
        other => Some(other.clone()),
    }
}

fn keep_attribute(attr: &Attribute) -> bool {
    let name = attr.name.local.as_ref().to_ascii_lowercase();
    if name.starts_with("on") || name == "style" {
        return false;
    }
    let value = attr.value.trim_start().to_ascii_lowercase();
    !(value.starts_with("javascript:") || value.starts_with("vbscript:"))
}

fn neutralize_link(attrs: &mut [Attribute]) {
    for attr in attrs.iter_mut() {
        let name = attr.name.local.as_ref();
        if name == "href" {
            attr.value = "#".to_string();
        }
    }
}
