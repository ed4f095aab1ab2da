//! Plain-text extraction from arena trees.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements whose text never renders.
pub(crate) const NON_RENDERED: &[&str] = &["script", "style", "template", "head", "title"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Concatenated text of every text node below `root`, like DOM `textContent`.
pub fn text_content(dom: &ArenaDom, root: ArenaNodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = dom.get(id) else {
            continue;
        };
        match &node.data {
            ArenaNodeData::Text(text) => out.push_str(text),
            ArenaNodeData::Element { name, .. } if NON_RENDERED.contains(&name.local.as_ref()) => {}
            _ => {
                let children: Vec<_> = dom.children(id).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }
    out
}

/// Text of `root` with paragraph breaks between block elements.
///
/// Runs of whitespace inside a block collapse to one space, blocks are separated
/// by a blank line and `<br>` becomes a newline.
pub fn block_text(dom: &ArenaDom, root: ArenaNodeId) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_blocks(dom, root, &mut blocks, &mut current);
    flush_block(&mut blocks, &mut current);
    blocks.join("\n\n")
}

fn collect_blocks(dom: &ArenaDom, id: ArenaNodeId, blocks: &mut Vec<String>, current: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };
    match &node.data {
        ArenaNodeData::Text(text) => {
            for (i, part) in text.split_whitespace().enumerate() {
                let leading_space = i > 0 || text.starts_with(char::is_whitespace);
                if leading_space && !current.is_empty() && !current.ends_with([' ', '\n']) {
                    current.push(' ');
                }
                current.push_str(part);
            }
            if text.ends_with(char::is_whitespace) && !current.is_empty() && !current.ends_with([' ', '\n']) {
                current.push(' ');
            }
        }
        ArenaNodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if NON_RENDERED.contains(&tag) {
                return;
            }
            if tag == "br" {
                let trimmed = current.trim_end().len();
                current.truncate(trimmed);
                current.push('\n');
                return;
            }
            let block = BLOCK_ELEMENTS.contains(&tag);
            if block {
                flush_block(blocks, current);
            }
            for child in dom.children(id) {
                collect_blocks(dom, child, blocks, current);
            }
            if block {
                flush_block(blocks, current);
            } else if matches!(tag, "td" | "th") && !current.ends_with([' ', '\n']) && !current.is_empty() {
                current.push(' ');
            }
        }
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                collect_blocks(dom, child, blocks, current);
            }
        }
        ArenaNodeData::Comment(_) => {}
    }
}

fn flush_block(blocks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
    current.clear();
}
