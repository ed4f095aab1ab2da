//! Normalized character stream over a rich rendering.

use memchr::memmem;

use crate::markup::{self, ArenaDom, ArenaNodeData, ArenaNodeId, TextPoint, TreeOrder};
use crate::normalize::fold_char_into;

/// Location in the rich rendering just after a matched character.
pub type RichPosition = TextPoint;

/// Letters and numbers of a rendering, case-folded, with a parallel table
/// mapping each of them back into the rendering.
///
/// Built once per rendering and read-only afterwards.
pub struct AlignmentIndex {
    dom: ArenaDom,
    order: TreeOrder,
    root: ArenaNodeId,
    stream: String,
    /// Byte offset in `stream` where each normalized character starts.
    char_starts: Vec<usize>,
    positions: Vec<RichPosition>,
}

impl AlignmentIndex {
    /// Parse `rich` and index every letter/number in its rendered text.
    pub fn build(rich: &str) -> Self {
        let dom = markup::parse_html(rich);
        let root = dom.body();

        let mut stream = String::new();
        let mut char_starts = Vec::new();
        let mut positions = Vec::new();

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = dom.get(id) else {
                continue;
            };
            match &node.data {
                ArenaNodeData::Text(text) => {
                    for (offset, c) in text.char_indices() {
                        let before = stream.len();
                        if !fold_char_into(c, &mut stream) {
                            continue;
                        }
                        let after = TextPoint {
                            node: id,
                            offset: offset + c.len_utf8(),
                        };
                        for (i, _) in stream[before..].char_indices() {
                            char_starts.push(before + i);
                            positions.push(after);
                        }
                    }
                }
                ArenaNodeData::Element { name, .. }
                    if markup::NON_RENDERED.contains(&name.local.as_ref()) => {}
                _ => {
                    let children: Vec<_> = dom.children(id).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }

        let order = TreeOrder::new(&dom);
        Self {
            dom,
            order,
            root,
            stream,
            char_starts,
            positions,
        }
    }

    /// The normalized (alphanumeric, case-folded) character stream.
    pub fn normalized_stream(&self) -> &str {
        &self.stream
    }

    /// One position per character of [`normalized_stream`](Self::normalized_stream).
    pub fn positions(&self) -> &[RichPosition] {
        &self.positions
    }

    /// Number of characters in the normalized stream.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Character index of the first occurrence of `needle` in the stream.
    pub fn find(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let byte = memmem::find(self.stream.as_bytes(), needle.as_bytes())?;
        // UTF-8 is self-synchronizing, so a match always starts on a char boundary.
        self.char_starts.binary_search(&byte).ok()
    }

    /// Length of the run where `folded` matches the stream starting at `start`.
    pub fn common_prefix_len(&self, start: usize, folded: &str) -> usize {
        let Some(&byte) = self.char_starts.get(start) else {
            return 0;
        };
        self.stream[byte..]
            .chars()
            .zip(folded.chars())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Serialize the rendering from just after character `start - 1` (or the
    /// beginning when `start == 0`) up to just after character `end - 1`.
    ///
    /// Returns an empty string for an empty or out-of-range span.
    pub fn slice(&self, start: usize, end: usize) -> String {
        if end <= start || end > self.positions.len() {
            return String::new();
        }
        let from = start.checked_sub(1).map(|i| self.positions[i]);
        let to = self.positions[end - 1];
        markup::serialize_range(&self.dom, &self.order, self.root, from, to)
    }
}

impl std::fmt::Debug for AlignmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentIndex")
            .field("len", &self.positions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_skips_non_alnum() {
        let index = AlignmentIndex::build("<p>Hello, <b>World</b>!</p><p>42 times</p>");
        assert_eq!(index.normalized_stream(), "helloworld42times");
        assert_eq!(index.len(), 17);
        assert_eq!(index.positions().len(), index.len());
    }

    #[test]
    fn test_stream_ignores_non_rendered_text() {
        let index = AlignmentIndex::build("<style>p{}</style><p>ok</p><script>var x</script>");
        assert_eq!(index.normalized_stream(), "ok");
    }

    #[test]
    fn test_positions_point_after_each_char() {
        let index = AlignmentIndex::build("<p>ab c</p>");
        let offsets: Vec<_> = index.positions().iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![1, 2, 4]);
    }

    #[test]
    fn test_find_returns_char_index() {
        let index = AlignmentIndex::build("<p>Ünïcode text</p>");
        assert_eq!(index.normalized_stream(), "ünïcodetext");
        assert_eq!(index.find("text"), Some(7));
        assert_eq!(index.find("nope"), None);
    }

    #[test]
    fn test_slice() {
        let index = AlignmentIndex::build("<p>Hello world</p>");
        assert_eq!(index.slice(0, 5), "<p>Hello</p>");
        // Both ends inside one text node: no enclosing tags.
        assert_eq!(index.slice(5, 10), " world");
        assert_eq!(index.slice(3, 3), "");
    }
}
