//! Text normalization shared by the parsers and the aligner.

/// Case-fold a single letter or number into `out`.
///
/// Returns `false` (and appends nothing) for whitespace, punctuation and symbols.
/// Foldings that expand to several characters push all of them.
#[inline]
pub fn fold_char_into(c: char, out: &mut String) -> bool {
    if !c.is_alphanumeric() {
        return false;
    }
    if c.is_ascii() {
        out.push(c.to_ascii_lowercase());
    } else {
        out.extend(c.to_lowercase());
    }
    true
}

/// Strip `text` down to its Unicode letters and numbers, lower-cased.
///
/// ```
/// assert_eq!(readalong::normalize::fold("Hello, World! 42"), "helloworld42");
/// ```
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        fold_char_into(c, &mut out);
    }
    out
}

/// Collapse every run of whitespace to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Whitespace-collapsed prefix of `text`, at most `max_chars` characters long.
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(text);
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}
