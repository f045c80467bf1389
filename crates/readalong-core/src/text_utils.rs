//! Case-insensitive matching and snippet helpers shared by TOC resolution
//! and search.

use std::ops::Range;

/// One lowercase char together with the byte range of the source char it
/// came from. A source char may fold to several lowercase chars.
struct Folded {
    ch: char,
    src: Range<usize>,
    first: bool,
}

fn fold(text: &str) -> Vec<Folded> {
    let mut out = Vec::with_capacity(text.len());
    for (start, ch) in text.char_indices() {
        let src = start..start + ch.len_utf8();
        for (i, lower) in ch.to_lowercase().enumerate() {
            out.push(Folded {
                ch: lower,
                src: src.clone(),
                first: i == 0,
            });
        }
    }
    out
}

/// Byte range of the first case-insensitive occurrence of `needle`.
///
/// An empty needle matches at offset zero.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Some(0..0);
    }
    let hay = fold(haystack);
    if needle.len() > hay.len() {
        return None;
    }
    for start in 0..=hay.len() - needle.len() {
        if !hay[start].first {
            continue;
        }
        let window = &hay[start..start + needle.len()];
        if window.iter().zip(&needle).all(|(h, n)| h.ch == *n) {
            let end = window.last().map(|f| f.src.end).unwrap_or(hay[start].src.start);
            return Some(hay[start].src.start..end);
        }
    }
    None
}

pub fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    find_case_insensitive(haystack, needle).is_some()
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Excerpt around `range` with `context` characters on each side, eliding
/// the cut ends with `...`.
pub fn snippet_around(text: &str, range: Range<usize>, context: usize) -> String {
    let before: Vec<usize> = text[..range.start].char_indices().map(|(i, _)| i).collect();
    let start = if before.len() > context {
        before[before.len() - context]
    } else {
        0
    };
    let end = match text[range.end..].char_indices().nth(context) {
        Some((idx, _)) => range.end + idx,
        None => text.len(),
    };

    let mut snippet = String::with_capacity(end - start + 6);
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&text[start..end]);
    if end < text.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Convert a UTF-16 code unit offset (what browser-style speech engines
/// report) into a byte offset into `text`. Offsets past the end clamp to
/// the text length.
pub fn utf16_to_byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0usize;
    for (idx, ch) in text.char_indices() {
        if units >= utf16_offset {
            return idx;
        }
        units += ch.len_utf16();
    }
    text.len()
}
