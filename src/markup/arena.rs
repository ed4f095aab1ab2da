//! Arena-based DOM for markup parsing.
//!
//! html5ever parses into this tree; sanitization and resource rewriting copy it
//! into fresh trees, and the alignment index addresses its text nodes by id.

use html5ever::{LocalName, QualName};

/// Index of a node in its [`ArenaDom`]. Only meaningful for the arena that
/// allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaNodeId(u32);

impl ArenaNodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum ArenaNodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    Text(String),
    /// Kept so the tree mirrors the source; never serialized.
    Comment(String),
}

impl ArenaNodeData {
    /// Local tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ArenaNodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Attribute name as written in markup (`xlink:href`, `epub:type`, `src`).
    pub fn qualified_name(&self) -> String {
        match &self.name.prefix {
            Some(prefix) => format!("{}:{}", prefix.as_ref(), self.name.local.as_ref()),
            None => self.name.local.to_string(),
        }
    }
}

/// A node plus its links to neighbours.
#[derive(Debug)]
pub struct ArenaNode {
    pub data: ArenaNodeData,
    pub parent: Option<ArenaNodeId>,
    pub first_child: Option<ArenaNodeId>,
    pub last_child: Option<ArenaNodeId>,
    pub prev_sibling: Option<ArenaNodeId>,
    pub next_sibling: Option<ArenaNodeId>,
}

impl From<ArenaNodeData> for ArenaNode {
    fn from(data: ArenaNodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// Tree whose nodes live in one vector and refer to each other by index.
///
/// Nodes are never freed: detaching only unlinks them, so ids stay valid for
/// the life of the arena.
#[derive(Debug)]
pub struct ArenaDom {
    nodes: Vec<ArenaNode>,
}

impl ArenaDom {
    const ROOT: ArenaNodeId = ArenaNodeId(0);

    /// An arena holding only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![ArenaNode::from(ArenaNodeData::Document)],
        }
    }

    fn alloc(&mut self, data: ArenaNodeData) -> ArenaNodeId {
        let id = ArenaNodeId(self.nodes.len() as u32);
        self.nodes.push(data.into());
        id
    }

    pub fn document(&self) -> ArenaNodeId {
        Self::ROOT
    }

    pub fn get(&self, id: ArenaNodeId) -> Option<&ArenaNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: ArenaNodeId) -> Option<&mut ArenaNode> {
        self.nodes.get_mut(id.index())
    }

    fn link(&self, id: ArenaNodeId, pick: fn(&ArenaNode) -> Option<ArenaNodeId>) -> Option<ArenaNodeId> {
        self.get(id).and_then(pick)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> ArenaNodeId {
        self.alloc(ArenaNodeData::Element { name, attrs })
    }

    pub fn create_text(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNodeData::Text(text))
    }

    pub fn create_comment(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNodeData::Comment(text))
    }

    /// Link an unattached `child` as the last child of `parent`.
    pub fn append(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        let prev = self.link(parent, |n| n.last_child);
        self.splice(parent, prev, None, child);
    }

    /// Link an unattached `node` directly before `sibling`. No-op if `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, sibling: ArenaNodeId, node: ArenaNodeId) {
        let Some(parent) = self.link(sibling, |n| n.parent) else {
            return;
        };
        let prev = self.link(sibling, |n| n.prev_sibling);
        self.splice(parent, prev, Some(sibling), node);
    }

    /// Put `node` under `parent` between `prev` and `next` (adjacent siblings,
    /// `None` meaning the respective end of the child list).
    fn splice(
        &mut self,
        parent: ArenaNodeId,
        prev: Option<ArenaNodeId>,
        next: Option<ArenaNodeId>,
        node: ArenaNodeId,
    ) {
        if let Some(n) = self.get_mut(node) {
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = next;
        }
        match prev.and_then(|p| self.get_mut(p)) {
            Some(p) => p.next_sibling = Some(node),
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = Some(node);
                }
            }
        }
        match next.and_then(|n| self.get_mut(n)) {
            Some(n) => n.prev_sibling = Some(node),
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = Some(node);
                }
            }
        }
    }

    /// Add text at the end of `parent`, extending a trailing text node if
    /// there is one.
    pub fn append_text(&mut self, parent: ArenaNodeId, text: &str) {
        let last = self.link(parent, |n| n.last_child);
        if let Some(ArenaNodeData::Text(existing)) =
            last.and_then(|id| self.get_mut(id)).map(|n| &mut n.data)
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text.to_owned());
        self.append(parent, node);
    }

    /// Unlink `node` from its parent and siblings. Its own subtree stays intact.
    pub fn detach(&mut self, node: ArenaNodeId) {
        let Some(n) = self.get_mut(node) else {
            return;
        };
        let (parent, prev, next) = (n.parent.take(), n.prev_sibling.take(), n.next_sibling.take());

        match prev.and_then(|p| self.get_mut(p)) {
            Some(p) => p.next_sibling = next,
            None => {
                if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
                    p.first_child = next;
                }
            }
        }
        match next.and_then(|n| self.get_mut(n)) {
            Some(n) => n.prev_sibling = prev,
            None => {
                if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
                    p.last_child = prev;
                }
            }
        }
    }

    /// Allocated nodes, detached ones included. Ids are below this bound.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn children(&self, parent: ArenaNodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.link(parent, |n| n.first_child),
        }
    }

    /// `root` and everything below it, in document order.
    pub fn descendants(&self, root: ArenaNodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            stack: vec![root],
        }
    }

    /// First element named `tag` in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<ArenaNodeId> {
        self.descendants(Self::ROOT)
            .find(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == tag))
    }

    /// The `<body>` element, or the document root when there is none.
    pub fn body(&self) -> ArenaNodeId {
        self.find_by_tag("body").unwrap_or(Self::ROOT)
    }

    /// Copy the tree into a new arena, letting `f` rewrite or drop each node.
    ///
    /// `f` sees every node reachable from the document root except those below a
    /// dropped node. Returning `None` drops the node with its whole subtree.
    /// The source tree is never modified.
    pub fn map_tree<F>(&self, mut f: F) -> ArenaDom
    where
        F: FnMut(&ArenaDom, ArenaNodeId) -> Option<ArenaNodeData>,
    {
        let mut out = ArenaDom::new();
        let mut pending: Vec<(ArenaNodeId, ArenaNodeId)> =
            self.children(Self::ROOT).map(|c| (c, Self::ROOT)).collect();
        pending.reverse();

        while let Some((src, into)) = pending.pop() {
            let Some(data) = f(self, src) else {
                continue;
            };
            let data = match data {
                // Merges with a preceding text run even across a dropped element.
                ArenaNodeData::Text(text) => {
                    out.append_text(into, &text);
                    continue;
                }
                other => other,
            };
            let copy = out.alloc(data);
            out.append(into, copy);

            let mark = pending.len();
            pending.extend(self.children(src).map(|c| (c, copy)));
            pending[mark..].reverse();
        }

        out
    }

    pub fn element_name(&self, id: ArenaNodeId) -> Option<&LocalName> {
        match &self.get(id)?.data {
            ArenaNodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        }
    }

    /// Attributes of an element; empty for every other node.
    pub fn attrs(&self, id: ArenaNodeId) -> &[Attribute] {
        match self.get(id).map(|n| &n.data) {
            Some(ArenaNodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    /// Attribute value by qualified name (`src`, `xlink:href`, `epub:type`).
    ///
    /// The HTML parser only splits prefixes it knows (`xlink:`, `xml:`); any
    /// other `prefix:name` attribute keeps the whole string as its local name,
    /// so both spellings are accepted.
    pub fn get_attr(&self, id: ArenaNodeId, attr_name: &str) -> Option<&str> {
        let (prefix, local) = match attr_name.split_once(':') {
            Some((p, l)) => (Some(p), l),
            None => (None, attr_name),
        };
        self.attrs(id)
            .iter()
            .find(|a| {
                let name = &a.name;
                match name.prefix.as_deref() {
                    Some(p) => Some(p) == prefix && name.local.as_ref() == local,
                    None => name.local.as_ref() == attr_name,
                }
            })
            .map(|a| a.value.as_str())
    }

    /// The string held by a text node.
    pub fn text_content(&self, id: ArenaNodeId) -> Option<&str> {
        match &self.get(id)?.data {
            ArenaNodeData::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Children<'a> {
    dom: &'a ArenaDom,
    next: Option<ArenaNodeId>,
}

impl Iterator for Children<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<ArenaNodeId> {
        let id = self.next?;
        self.next = self.dom.link(id, |n| n.next_sibling);
        Some(id)
    }
}

/// Pre-order traversal.
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    stack: Vec<ArenaNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<ArenaNodeId> {
        let id = self.stack.pop()?;
        let mut child = self.dom.link(id, |n| n.last_child);
        while let Some(c) = child {
            self.stack.push(c);
            child = self.dom.link(c, |n| n.prev_sibling);
        }
        Some(id)
    }
}
