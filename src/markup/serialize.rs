//! Serialize arena trees (or ranges of them) back to HTML.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Serialize the children of `node` (its "inner HTML").
pub fn inner_html(dom: &ArenaDom, node: ArenaNodeId) -> String {
    let mut out = String::new();
    for child in dom.children(node) {
        write_node(dom, child, &mut out);
    }
    out
}

/// Serialize `node` including its own tags.
pub fn outer_html(dom: &ArenaDom, node: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

fn write_node(dom: &ArenaDom, node: ArenaNodeId, out: &mut String) {
    let Some(n) = dom.get(node) else {
        return;
    };
    match &n.data {
        ArenaNodeData::Document => {
            for child in dom.children(node) {
                write_node(dom, child, out);
            }
        }
        ArenaNodeData::Element { .. } => {
            let void = write_open_tag(dom, node, out);
            if !void {
                for child in dom.children(node) {
                    write_node(dom, child, out);
                }
                write_close_tag(dom, node, out);
            }
        }
        ArenaNodeData::Text(text) => write_text(dom, n.parent, text, out),
        ArenaNodeData::Comment(_) => {}
    }
}

/// Writes `<tag attrs>`; returns true for void elements, which take no close tag.
fn write_open_tag(dom: &ArenaDom, node: ArenaNodeId, out: &mut String) -> bool {
    let Some(tag) = dom.element_name(node) else {
        return true;
    };
    out.push('<');
    out.push_str(tag);
    for attr in dom.attrs(node) {
        out.push(' ');
        out.push_str(&attr.qualified_name());
        out.push_str("=\"");
        escape_attr(&attr.value, out);
        out.push('"');
    }
    out.push('>');
    VOID_ELEMENTS.contains(&tag.as_ref())
}

fn write_close_tag(dom: &ArenaDom, node: ArenaNodeId, out: &mut String) {
    if let Some(tag) = dom.element_name(node) {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn write_text(dom: &ArenaDom, parent: Option<ArenaNodeId>, text: &str, out: &mut String) {
    let raw = parent
        .and_then(|p| dom.element_name(p))
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag.as_ref()));
    if raw {
        out.push_str(text);
    } else {
        escape_text(text, out);
    }
}

pub fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

pub fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// A point inside a text node: the byte offset into its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPoint {
    pub node: ArenaNodeId,
    pub offset: usize,
}

/// Pre-order numbering of a tree, for O(1) ancestor and ordering tests.
#[derive(Debug)]
pub struct TreeOrder {
    pre: Vec<u32>,
    last: Vec<u32>,
}

impl TreeOrder {
    pub fn new(dom: &ArenaDom) -> Self {
        let mut pre = vec![u32::MAX; dom.len()];
        let mut last = vec![0; dom.len()];
        let mut order: Vec<ArenaNodeId> = Vec::with_capacity(dom.len());

        for (i, id) in dom.descendants(dom.document()).enumerate() {
            pre[id.index()] = i as u32;
            order.push(id);
        }

        // Children come after their parent in pre-order, so a reverse sweep sees
        // every descendant's `last` before the ancestor reads it.
        for &id in order.iter().rev() {
            let own = pre[id.index()];
            let deepest = dom
                .get(id)
                .and_then(|n| n.last_child)
                .map(|c| last[c.index()])
                .unwrap_or(own);
            last[id.index()] = deepest.max(own);
        }

        Self { pre, last }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: ArenaNodeId, node: ArenaNodeId) -> bool {
        let (a, n) = (self.pre[ancestor.index()], self.pre[node.index()]);
        a <= n && n <= self.last[ancestor.index()]
    }

    fn pre(&self, node: ArenaNodeId) -> u32 {
        self.pre[node.index()]
    }

    fn last(&self, node: ArenaNodeId) -> u32 {
        self.last[node.index()]
    }
}

/// Serialize the content between two text points below `root`.
///
/// `start = None` means the very beginning of `root`. Follows DOM Range
/// `cloneContents`: boundary text nodes are cut, elements lying wholly inside
/// the range are copied whole, elements containing exactly one boundary are
/// emitted with their tags around the selected part, and ancestors of both
/// boundaries contribute only their selected children.
pub fn serialize_range(
    dom: &ArenaDom,
    order: &TreeOrder,
    root: ArenaNodeId,
    start: Option<TextPoint>,
    end: TextPoint,
) -> String {
    let range = RangeWriter {
        dom,
        order,
        start,
        end,
    };
    let mut out = String::new();
    for child in dom.children(root) {
        range.write(child, &mut out);
    }
    out
}

struct RangeWriter<'a> {
    dom: &'a ArenaDom,
    order: &'a TreeOrder,
    start: Option<TextPoint>,
    end: TextPoint,
}

impl RangeWriter<'_> {
    fn holds_start(&self, node: ArenaNodeId) -> bool {
        self.start
            .is_some_and(|s| self.order.contains(node, s.node))
    }

    fn holds_end(&self, node: ArenaNodeId) -> bool {
        self.order.contains(node, self.end.node)
    }

    /// Entire subtree lies strictly between the two boundaries.
    fn inside(&self, node: ArenaNodeId) -> bool {
        let after_start = self
            .start
            .is_none_or(|s| self.order.pre(node) > self.order.pre(s.node));
        after_start && self.order.last(node) < self.order.pre(self.end.node)
    }

    fn write(&self, node: ArenaNodeId, out: &mut String) {
        let Some(n) = self.dom.get(node) else {
            return;
        };
        let has_start = self.holds_start(node);
        let has_end = self.holds_end(node);

        match &n.data {
            ArenaNodeData::Text(text) => {
                let from = if has_start {
                    self.start.map(|s| s.offset).unwrap_or(0)
                } else {
                    0
                };
                let to = if has_end { self.end.offset } else { text.len() };
                if (has_start || has_end || self.inside(node)) && from < to {
                    let slice = text.get(from..to).unwrap_or_default();
                    write_text(self.dom, n.parent, slice, out);
                }
            }
            ArenaNodeData::Element { .. } => {
                if has_start && has_end {
                    for child in self.dom.children(node) {
                        self.write(child, out);
                    }
                } else if has_start || has_end {
                    if !write_open_tag(self.dom, node, out) {
                        for child in self.dom.children(node) {
                            self.write(child, out);
                        }
                        write_close_tag(self.dom, node, out);
                    }
                } else if self.inside(node) {
                    write_node(self.dom, node, out);
                }
            }
            ArenaNodeData::Document | ArenaNodeData::Comment(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_html;

    fn text_point(dom: &ArenaDom, text: &str, offset: usize) -> TextPoint {
        let node = dom
            .descendants(dom.document())
            .find(|&id| dom.text_content(id) == Some(text))
            .expect("text node");
        TextPoint { node, offset }
    }

    #[test]
    fn test_inner_html_roundtrip() {
        let dom = parse_html(r#"<p class="x">a &amp; b<br><img src="i.png"></p>"#);
        assert_eq!(
            inner_html(&dom, dom.body()),
            r#"<p class="x">a &amp; b<br><img src="i.png"></p>"#
        );
    }

    #[test]
    fn test_range_within_one_text_node() {
        let dom = parse_html("<p>hello world</p>");
        let order = TreeOrder::new(&dom);
        let start = text_point(&dom, "hello world", 1);
        let end = text_point(&dom, "hello world", 5);
        assert_eq!(
            serialize_range(&dom, &order, dom.body(), Some(start), end),
            "ello"
        );
    }

    #[test]
    fn test_range_from_root_start_keeps_partial_ancestors() {
        let dom = parse_html("<div><p>hello world</p><p>more</p></div>");
        let order = TreeOrder::new(&dom);
        let end = text_point(&dom, "hello world", 3);
        assert_eq!(
            serialize_range(&dom, &order, dom.body(), None, end),
            "<div><p>hel</p></div>"
        );
    }

    #[test]
    fn test_range_across_elements() {
        let dom = parse_html("<p>one <b>two</b> three</p><p>four</p>");
        let order = TreeOrder::new(&dom);
        let start = text_point(&dom, "one ", 2);
        let end = text_point(&dom, "four", 2);
        assert_eq!(
            serialize_range(&dom, &order, dom.body(), Some(start), end),
            "<p>e <b>two</b> three</p><p>fo</p>"
        );
    }

    #[test]
    fn test_tree_order_contains() {
        let dom = parse_html("<div><p>a</p></div><span>b</span>");
        let order = TreeOrder::new(&dom);
        let div = dom.find_by_tag("div").unwrap();
        let span = dom.find_by_tag("span").unwrap();
        let a = text_point(&dom, "a", 0).node;
        assert!(order.contains(div, a));
        assert!(!order.contains(span, a));
        assert!(order.contains(dom.body(), a));
    }
}
