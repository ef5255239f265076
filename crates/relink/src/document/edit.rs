//! Span edits
//!
//! Rewrites are computed as byte-range replacements against the unmodified
//! text and applied in a single left-to-right pass, so one edit can never
//! shift or re-match another.

use std::ops::Range;
use tracing::debug;

/// Replace `span` of the original text with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(span: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    /// Apply this edit alone.
    pub fn apply_to(&self, text: &str) -> String {
        apply_edits(text, std::slice::from_ref(self))
    }
}

/// One edit per occurrence of `needle` in `text`.
///
/// Reproduces whole-document string replacement as span edits.
pub fn occurrences(text: &str, needle: &str, replacement: &str) -> Vec<TextEdit> {
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle)
        .map(|(start, _)| TextEdit::new(start..start + needle.len(), replacement))
        .collect()
}

/// Apply `edits` to `text` in one pass.
///
/// Edits are ordered by start offset; an edit overlapping one already
/// applied is dropped, as is any edit outside the text or not on a char
/// boundary.
///
/// ```
/// use relink::document::{apply_edits, TextEdit};
///
/// let text = "a.jpg and a.jpg";
/// let edits = vec![TextEdit::new(10..15, "a.webp")];
/// assert_eq!(apply_edits(text, &edits), "a.jpg and a.webp");
/// ```
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| (edit.span.start, edit.span.end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in ordered {
        let Range { start, end } = edit.span;
        if start < cursor
            || end < start
            || end > text.len()
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            debug!(start, end, "dropping overlapping or invalid edit");
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_apply_no_edits_is_identity() {
        assert_eq!(apply_edits("unchanged", &[]), "unchanged");
    }

    #[test]
    fn test_apply_unsorted_edits() {
        let text = "one two three";
        let edits = vec![TextEdit::new(8..13, "3"), TextEdit::new(0..3, "1")];
        assert_eq!(apply_edits(text, &edits), "1 two 3");
    }

    #[test]
    fn test_overlapping_edit_is_dropped() {
        let text = "abcdef";
        let edits = vec![TextEdit::new(0..4, "X"), TextEdit::new(2..5, "Y")];
        assert_eq!(apply_edits(text, &edits), "Xef");
    }

    #[test]
    fn test_out_of_range_edit_is_dropped() {
        assert_eq!(apply_edits("abc", &[TextEdit::new(2..10, "X")]), "abc");
    }

    #[test]
    fn test_non_char_boundary_edit_is_dropped() {
        let text = "图a";
        assert_eq!(apply_edits(text, &[TextEdit::new(1..3, "X")]), text);
    }

    #[test]
    fn test_occurrences_replaces_every_copy() {
        let text = "555.jpg and 555.jpg";
        let edits = occurrences(text, "555.jpg", "555.webp");
        assert_eq!(edits.len(), 2);
        assert_eq!(apply_edits(text, &edits), "555.webp and 555.webp");
    }

    #[test]
    fn test_occurrences_empty_needle() {
        assert!(occurrences("abc", "", "x").is_empty());
    }

    proptest! {
        #[test]
        fn prop_single_edit_matches_splice(
            text in "[a-z .]{0,40}",
            a in 0usize..40,
            b in 0usize..40,
            replacement in "[A-Z]{0,5}"
        ) {
            let len = text.len();
            let (start, end) = (a.min(b).min(len), a.max(b).min(len));
            let mut expected = text.clone();
            expected.replace_range(start..end, &replacement);

            let edit = TextEdit::new(start..end, replacement.clone());
            prop_assert_eq!(edit.apply_to(&text), expected);
        }

        #[test]
        fn prop_disjoint_edits_preserve_untouched_text(
            text in "[a-z]{10,40}",
            cut in 1usize..5
        ) {
            // Two disjoint edits: the text between them survives verbatim.
            let edits = vec![
                TextEdit::new(0..cut, "<"),
                TextEdit::new(text.len() - cut..text.len(), ">"),
            ];
            let out = apply_edits(&text, &edits);
            let middle = &text[cut..text.len() - cut];
            prop_assert_eq!(out, format!("<{}>", middle));
        }
    }
}
