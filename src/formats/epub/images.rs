use std::collections::HashMap;

use html5ever::{LocalName, QualName, ns};
use tracing::{debug, warn};

use super::archive::Archive;
use crate::document::ResourceStore;
use crate::markup::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute};
use crate::util::{detect_media_format, is_external_reference, resolve_href};

/// Lazy-loading conventions, tried after `src` and `srcset`.
const LAZY_ATTRS: &[&str] = &["data-src", "data-original", "data-lazy-src"];

/// Points embedded images at resource handles.
///
/// One rewriter serves a whole book so an image referenced from several
/// chapters gets a single handle.
pub struct ImageRewriter<'a> {
    archive: &'a Archive,
    store: &'a dyn ResourceStore,
    /// Lower-cased archive path -> handle.
    handles: HashMap<String, String>,
    created: Vec<String>,
}

impl<'a> ImageRewriter<'a> {
    pub fn new(archive: &'a Archive, store: &'a dyn ResourceStore) -> Self {
        Self {
            archive,
            store,
            handles: HashMap::new(),
            created: Vec::new(),
        }
    }

    /// Copy of `dom` with image references of the item at `item_path` rewritten.
    pub fn rewrite(&mut self, dom: &ArenaDom, item_path: &str) -> ArenaDom {
        dom.map_tree(|src, id| self.rewrite_node(src, id, item_path))
    }

    /// Handles created so far, in creation order.
    pub fn into_handles(self) -> Vec<String> {
        self.created
    }

    fn rewrite_node(&mut self, dom: &ArenaDom, id: ArenaNodeId, item_path: &str) -> Option<ArenaNodeData> {
        let node = dom.get(id)?;
        let ArenaNodeData::Element { name, attrs } = &node.data else {
            return Some(node.data.clone());
        };

        let attrs = match name.local.as_ref() {
            "img" => self.rewrite_img(attrs, item_path),
            "image" => self.rewrite_svg_image(attrs, item_path),
            _ => None,
        }
        .unwrap_or_else(|| attrs.clone());

        Some(ArenaNodeData::Element {
            name: name.clone(),
            attrs,
        })
    }

    fn rewrite_img(&mut self, attrs: &[Attribute], item_path: &str) -> Option<Vec<Attribute>> {
        let reference = img_reference(attrs)?;
        let handle = self.handle_for(&reference, item_path)?;

        let mut rewritten: Vec<Attribute> = attrs
            .iter()
            .filter(|a| {
                let name = a.name.local.as_ref();
                name != "src" && name != "srcset" && !LAZY_ATTRS.contains(&name)
            })
            .cloned()
            .collect();
        rewritten.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from("src")),
            value: handle,
        });
        Some(rewritten)
    }

    fn rewrite_svg_image(&mut self, attrs: &[Attribute], item_path: &str) -> Option<Vec<Attribute>> {
        let position = attrs
            .iter()
            .position(|a| a.name.local.as_ref() == "href" && !a.value.trim().is_empty())?;
        let handle = self.handle_for(&attrs[position].value, item_path)?;

        let mut rewritten = attrs.to_vec();
        rewritten[position].value = handle;
        Some(rewritten)
    }

    fn handle_for(&mut self, reference: &str, item_path: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() || is_external_reference(reference) {
            return None;
        }

        let path = resolve_href(item_path, reference);
        let key = path.to_lowercase();
        if let Some(handle) = self.handles.get(&key) {
            return Some(handle.clone());
        }

        let archive = self.archive;
        let Some(data) = archive.get(&path) else {
            warn!(item = item_path, image = %path, "image not found in archive");
            return None;
        };

        let mime_type = detect_media_format(&path, data).mime_type();
        let handle = self.store.create(data, mime_type);
        debug!(image = %path, mime_type, bytes = data.len(), "created image handle");

        self.handles.insert(key, handle.clone());
        self.created.push(handle.clone());
        Some(handle)
    }
}

/// Image reference of an `img`: `src`, the first `srcset` candidate, then lazy-loading attributes.
fn img_reference(attrs: &[Attribute]) -> Option<String> {
    let get = |name: &str| {
        attrs
            .iter()
            .find(|a| a.name.prefix.is_none() && a.name.local.as_ref() == name)
            .map(|a| a.value.trim())
            .filter(|v| !v.is_empty())
    };

    if let Some(src) = get("src") {
        return Some(src.to_string());
    }
    if let Some(first) = get("srcset")
        .and_then(|set| set.split(',').next())
        .and_then(|candidate| candidate.split_whitespace().next())
    {
        return Some(first.to_string());
    }
    LAZY_ATTRS.iter().find_map(|name| get(name)).map(str::to_string)
}
