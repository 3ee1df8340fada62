//! Locate extracts in a document and merge their ranges into disjoint spans.
//!
//! # Algorithm
//!
//! 1. For each extract, find its first literal occurrence in the text.
//!    Matching is plain substring search: `.`, `(` and friends match
//!    themselves. Extracts that cannot be found are dropped.
//! 2. The last located extract in input order (the most recently added
//!    codebook row) is flagged as the latest anchor.
//! 3. Sort occurrences by `start`.
//! 4. Interval union: a span whose `start` falls inside `[last.start,
//!    last.end]` extends the last accepted span; anything else starts a new
//!    span. Touching spans therefore merge too, so markup is never nested
//!    or doubled.
//!
//! Offsets are byte offsets into `text`, half-open, always on `char`
//! boundaries.
//!
//! # Example
//!
//! ```rust
//! use codemark_core::spans::merge;
//!
//! let spans = merge("the cat sat on the mat", &["cat sat", "sat on", "mat"]);
//! assert_eq!(spans.len(), 2);
//! assert_eq!((spans[0].start, spans[0].end), (4, 14));
//! assert!(spans[1].is_latest);
//! ```

use crate::models::HighlightSpan;

/// Merge the located occurrences of `extracts` into disjoint spans.
///
/// Unlocated extracts are logged at debug level and otherwise ignored.
pub fn merge<S: AsRef<str>>(text: &str, extracts: &[S]) -> Vec<HighlightSpan> {
    merge_with(text, extracts, |index, extract| {
        tracing::debug!(index, extract, "extract not found in document text");
    })
}

/// Like [`merge`], calling `on_unlocated(index, extract)` for every extract
/// whose text does not occur in `text`.
pub fn merge_with<S, F>(text: &str, extracts: &[S], mut on_unlocated: F) -> Vec<HighlightSpan>
where
    S: AsRef<str>,
    F: FnMut(usize, &str),
{
    let mut located = locate(text, extracts, &mut on_unlocated);

    if let Some(last) = located.last_mut() {
        last.is_latest = true;
    }

    located.sort_by_key(|span| span.start);

    if located.len() < 2 {
        return located;
    }

    union(located)
}

/// Find the first literal occurrence of each extract, in input order.
fn locate<S, F>(text: &str, extracts: &[S], on_unlocated: &mut F) -> Vec<HighlightSpan>
where
    S: AsRef<str>,
    F: FnMut(usize, &str),
{
    let mut located = Vec::with_capacity(extracts.len());
    for (index, extract) in extracts.iter().enumerate() {
        let needle = extract.as_ref();
        if needle.is_empty() {
            continue;
        }
        match text.find(needle) {
            Some(start) => located.push(HighlightSpan::new(start, start + needle.len())),
            None => on_unlocated(index, needle),
        }
    }
    located
}

/// Union of spans already sorted by `start`.
fn union(sorted: Vec<HighlightSpan>) -> Vec<HighlightSpan> {
    let mut merged: Vec<HighlightSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start >= last.start && span.start <= last.end => {
                last.end = last.end.max(span.end);
                last.is_latest |= span.is_latest;
            }
            _ => merged.push(span),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(spans: &[HighlightSpan]) -> Vec<(usize, usize)> {
        spans.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn union_of_overlapping_intervals() {
        let spans = union(vec![
            HighlightSpan::new(0, 10),
            HighlightSpan::new(5, 15),
            HighlightSpan::new(20, 25),
        ]);
        assert_eq!(ranges(&spans), vec![(0, 15), (20, 25)]);
    }

    #[test]
    fn union_is_idempotent_on_disjoint_spans() {
        let disjoint = vec![
            HighlightSpan::new(0, 3),
            HighlightSpan::new(5, 8),
            HighlightSpan::new(12, 20),
        ];
        let once = union(disjoint.clone());
        assert_eq!(once, disjoint);
        assert_eq!(union(once.clone()), once);
    }

    #[test]
    fn contained_interval_keeps_outer_end() {
        let spans = union(vec![HighlightSpan::new(0, 20), HighlightSpan::new(4, 6)]);
        assert_eq!(ranges(&spans), vec![(0, 20)]);
    }

    #[test]
    fn touching_spans_merge() {
        let spans = merge("abcdef", &["abc", "def"]);
        assert_eq!(ranges(&spans), vec![(0, 6)]);
    }

    #[test]
    fn merge_is_idempotent_through_text() {
        let text = "alpha beta gamma delta";
        let first = merge(text, &["alpha", "gamma"]);
        let texts: Vec<&str> = first.iter().map(|s| &text[s.start..s.end]).collect();
        let second = merge(text, &texts);
        assert_eq!(ranges(&first), ranges(&second));
    }

    #[test]
    fn no_extracts_no_spans() {
        let empty: [&str; 0] = [];
        assert!(merge("some text", &empty).is_empty());
    }

    #[test]
    fn single_extract_is_latest() {
        let spans = merge("hello world", &["world"]);
        assert_eq!(ranges(&spans), vec![(6, 11)]);
        assert!(spans[0].is_latest);
    }

    #[test]
    fn metacharacters_match_literally() {
        // as a pattern "a.b" would match "a1b" at offset 0
        let text = "a1b a.b (x)";
        let spans = merge(text, &["a.b", "(x)"]);
        assert_eq!(ranges(&spans), vec![(4, 7), (8, 11)]);
        assert_eq!(&text[8..11], "(x)");
    }

    #[test]
    fn unlocated_extracts_are_reported_and_dropped() {
        let mut missing = Vec::new();
        let spans = merge_with("one two three", &["two", "four", "three"], |i, t| {
            missing.push((i, t.to_string()))
        });
        assert_eq!(missing, vec![(1, "four".to_string())]);
        assert_eq!(ranges(&spans), vec![(4, 7), (8, 13)]);
        assert!(spans[1].is_latest);
    }

    #[test]
    fn latest_follows_insertion_order_not_position() {
        let spans = merge("one two three", &["three", "one"]);
        assert_eq!(ranges(&spans), vec![(0, 3), (8, 13)]);
        assert!(spans[0].is_latest);
        assert!(!spans[1].is_latest);
    }

    #[test]
    fn latest_survives_merge() {
        let spans = merge("abcdefghij", &["abcdef", "cdefgh", "xyz"]);
        assert_eq!(ranges(&spans), vec![(0, 8)]);
        assert!(spans[0].is_latest);
    }

    #[test]
    fn empty_extract_is_ignored() {
        let spans = merge("abc", &["", "b"]);
        assert_eq!(ranges(&spans), vec![(1, 2)]);
    }

    #[test]
    fn multibyte_offsets_stay_on_char_boundaries() {
        let text = "café crème brûlée";
        let spans = merge(text, &["crème", "brûlée"]);
        for s in &spans {
            assert!(text.is_char_boundary(s.start));
            assert!(text.is_char_boundary(s.end));
        }
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].start..spans[0].end], "crème");
        assert_eq!(&text[spans[1].start..spans[1].end], "brûlée");
    }
}
