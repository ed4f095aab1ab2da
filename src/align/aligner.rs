//! Progressive alignment of a growing reference text against a rendering.

use std::ops::Range;

use tracing::debug;

use super::index::AlignmentIndex;
use crate::normalize;

/// Seed lengths tried, longest first, when looking for the initial anchor.
pub const SEED_LENGTHS: &[usize] = &[128, 96, 64, 48, 32, 24, 16, 12, 8, 6, 4];

/// Part of the rendering matched by a reference text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Serialized markup covering the match.
    pub markup: String,
    /// Matched characters as indices into the normalized stream.
    pub stream_range: Range<usize>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.stream_range.is_empty()
    }
}

/// Finds which part of a rendering a growing reference text covers.
///
/// Starts unanchored; the first call whose reference contains a seed found in
/// the rendering fixes the anchor for good. Each later call re-measures the
/// match from that anchor, so callers must feed texts whose normalized form
/// only grows. Not meant to be shared across threads: drive one instance from
/// one sequential caller.
#[derive(Debug)]
pub struct ProgressiveAligner {
    index: AlignmentIndex,
    anchor: Option<usize>,
}

impl ProgressiveAligner {
    pub fn new(index: AlignmentIndex) -> Self {
        Self {
            index,
            anchor: None,
        }
    }

    /// Build the index for `rich` and wrap it.
    pub fn from_markup(rich: &str) -> Self {
        Self::new(AlignmentIndex::build(rich))
    }

    pub fn index(&self) -> &AlignmentIndex {
        &self.index
    }

    /// Stream index the reference was anchored at, if any.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Return the part of the rendering matching the longest prefix of `reference`.
    ///
    /// Never fails: no match (yet) yields an empty fragment.
    pub fn slice_by_reference(&mut self, reference: &str) -> Fragment {
        let folded = normalize::fold(reference);
        if folded.is_empty() {
            return Fragment::default();
        }

        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => match self.find_anchor(&folded) {
                Some(anchor) => {
                    self.anchor = Some(anchor);
                    anchor
                }
                None => return Fragment::default(),
            },
        };

        let matched = self.index.common_prefix_len(anchor, &folded);
        let end = anchor + matched;
        Fragment {
            markup: self.index.slice(anchor, end),
            stream_range: anchor..end,
        }
    }

    fn find_anchor(&self, folded: &str) -> Option<usize> {
        let available = folded.chars().count();
        let mut tried = None;

        for &seed_len in SEED_LENGTHS {
            let len = seed_len.min(available);
            if tried == Some(len) {
                continue;
            }
            tried = Some(len);

            let cut = folded
                .char_indices()
                .nth(len)
                .map(|(b, _)| b)
                .unwrap_or(folded.len());
            if let Some(anchor) = self.index.find(&folded[..cut]) {
                debug!(anchor, seed_len = len, "anchored reference text");
                return Some(anchor);
            }
        }

        None
    }
}
