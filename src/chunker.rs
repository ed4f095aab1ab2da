//! Word-safe splitting of long text runs into bounded sections.

use crate::document::SectionSpan;

/// Find where a section starting at `start` should end.
///
/// The ideal cut is `start + max_len`. Whitespace at or before that point (within
/// `window` characters) is preferred, then whitespace after it (again within
/// `window`), and only then a hard cut. The returned boundary sits just after the
/// chosen whitespace character, is always greater than `start` and never exceeds
/// `chars.len()`.
pub fn word_safe_boundary(chars: &[char], start: usize, max_len: usize, window: usize) -> usize {
    let len = chars.len();
    let target = start.saturating_add(max_len.max(1));
    if target >= len {
        return len;
    }

    let back_limit = target.saturating_sub(window).max(start);
    if let Some(i) = (back_limit..=target)
        .rev()
        .find(|&i| chars[i].is_whitespace())
    {
        return i + 1;
    }

    let forward_limit = target.saturating_add(window).min(len - 1);
    if let Some(i) = (target + 1..=forward_limit).find(|&i| chars[i].is_whitespace()) {
        return i + 1;
    }

    target
}

/// Split `chars[..]` into consecutive `(start, end)` ranges of roughly `max_len` characters.
///
/// Every range is non-empty; empty input yields no ranges.
pub fn split_ranges(chars: &[char], max_len: usize, window: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = word_safe_boundary(chars, start, max_len, window);
        debug_assert!(end > start);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Chunk a whole text into labeled sections `"{prefix} {n}"`.
///
/// Empty input produces exactly one empty section spanning `[0, 0)`.
pub(crate) fn chunk_sections(
    text: &str,
    max_len: usize,
    window: usize,
    label_prefix: &str,
) -> Vec<SectionSpan> {
    let chars: Vec<char> = text.chars().collect();
    let id_prefix = label_prefix.to_ascii_lowercase().replace(' ', "-");

    if chars.is_empty() {
        return vec![SectionSpan {
            id: format!("{id_prefix}-1"),
            label: format!("{label_prefix} 1"),
            start: 0,
            end: 0,
        }];
    }

    split_ranges(&chars, max_len, window)
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| SectionSpan {
            id: format!("{}-{}", id_prefix, i + 1),
            label: format!("{} {}", label_prefix, i + 1),
            start,
            end,
        })
        .collect()
}
