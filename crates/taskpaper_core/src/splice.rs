//! Byte-range edits shared by the tag and link collections.
//!
//! # Invariants
//! - Removal never eats line indentation: a token preceded only by
//!   whitespace takes its trailing whitespace with it instead.
//! - Appended tokens are always separated from existing content by one space.

use std::ops::Range;

/// Computes the range to cut when removing the token at `span`, where
/// `lead_start..span.start` is the whitespace that introduced it.
pub(crate) fn removal_range(text: &str, lead_start: usize, span: &Range<usize>) -> Range<usize> {
    let has_content_before = !text[..lead_start].trim().is_empty();
    if has_content_before && lead_start < span.start {
        return lead_start..span.end;
    }

    let rest = &text[span.end..];
    let trailing = rest.len() - rest.trim_start().len();
    span.start..span.end + trailing
}

/// Appends `token` to the end of `text`, separated by a single space.
pub(crate) fn append_token(text: &mut String, token: &str) {
    if !text.is_empty() && !text.ends_with(char::is_whitespace) {
        text.push(' ');
    }
    text.push_str(token);
}

/// Merges overlapping or touching ranges after sorting them by start.
pub(crate) fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|range| range.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Returns `text` with every range in `ranges` cut out.
pub(crate) fn strip_ranges(text: &str, ranges: Vec<Range<usize>>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in merge_ranges(ranges) {
        out.push_str(&text[cursor..range.start]);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::{append_token, merge_ranges, removal_range, strip_ranges};

    #[test]
    fn removal_takes_leading_whitespace_after_content() {
        let text = "buy milk @home";
        assert_eq!(removal_range(text, 8, &(9..14)), 8..14);
    }

    #[test]
    fn removal_keeps_indentation_and_takes_trailing_whitespace() {
        let text = "\t@home buy milk";
        let range = removal_range(text, 0, &(1..6));
        assert_eq!(range, 1..7);
        let mut edited = text.to_string();
        edited.replace_range(range, "");
        assert_eq!(edited, "\tbuy milk");
    }

    #[test]
    fn append_inserts_single_separator() {
        let mut text = String::from("hello");
        append_token(&mut text, "@a");
        assert_eq!(text, "hello @a");

        let mut empty = String::new();
        append_token(&mut empty, "@a");
        assert_eq!(empty, "@a");

        let mut indented = String::from("\t");
        append_token(&mut indented, "@a");
        assert_eq!(indented, "\t@a");
    }

    #[test]
    fn merge_and_strip_handle_overlaps() {
        assert_eq!(merge_ranges(vec![5..8, 0..2, 1..3]), vec![0..3, 5..8]);
        assert_eq!(strip_ranges("abcdefgh", vec![5..8, 0..2, 1..3]), "de");
    }
}
