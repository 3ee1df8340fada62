//! Highlight markup for a single document.
//!
//! Rendering runs in three steps:
//!
//! 1. [`normalize_whitespace`] collapses line breaks and whitespace runs to
//!    single spaces. Span offsets are only meaningful against this
//!    normalized string, so it happens exactly once, before merging.
//! 2. [`crate::spans::merge`] turns extract texts into disjoint spans.
//! 3. [`render`] wraps each span in a `<mark>` element, working from the
//!    highest `start` to the lowest so that markup already emitted never
//!    shifts the offsets of spans still to be processed.
//!
//! The span holding the most recent extract gets an `id` so the viewer can
//! scroll to it, but only for documents longer than
//! [`RenderOptions::scroll_threshold`] characters.

use serde::Serialize;

use crate::models::HighlightSpan;
use crate::spans;

/// Documents at or below this many characters are shown without a scroll
/// anchor.
pub const DEFAULT_SCROLL_THRESHOLD: usize = 600;

/// Markup settings for [`render`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// CSS class on every `<mark>` element.
    pub mark_class: String,
    /// `id` given to the latest span when the document is long enough.
    pub anchor_id: String,
    /// Minimum normalized length (in chars) before the anchor is emitted.
    pub scroll_threshold: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mark_class: "extract".to_string(),
            anchor_id: "latest-extract".to_string(),
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }
}

/// Output of the full highlight pipeline for one document.
#[derive(Debug, Clone, Serialize)]
pub struct Highlighted {
    /// Whitespace-normalized document text the spans index into.
    pub text: String,
    pub spans: Vec<HighlightSpan>,
    pub html: String,
    /// Extract texts that could not be found in `text`.
    pub unlocated: Vec<String>,
}

/// Collapse every run of whitespace, line breaks included, to one space.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Wrap `spans` of an already normalized `text` in highlight markup.
///
/// `spans` must be disjoint; their order does not matter. Text outside and
/// inside spans is HTML-escaped.
pub fn render(text: &str, spans: &[HighlightSpan], options: &RenderOptions) -> String {
    let with_anchor = text.chars().count() > options.scroll_threshold;

    let mut ordered: Vec<&HighlightSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    // Pieces are produced back to front and reversed at the end.
    let mut pieces: Vec<String> = Vec::with_capacity(ordered.len() * 4 + 1);
    let mut tail_start = text.len();
    for span in ordered {
        let end = span.end.min(tail_start);
        if span.start >= end {
            continue;
        }
        pieces.push(escape(&text[end..tail_start]));
        pieces.push("</mark>".to_string());
        pieces.push(escape(&text[span.start..end]));
        pieces.push(open_tag(options, span.is_latest && with_anchor));
        tail_start = span.start;
    }
    pieces.push(escape(&text[..tail_start]));

    pieces.reverse();
    pieces.concat()
}

/// Normalize `raw`, locate and merge `extracts`, and render the markup.
pub fn highlight<S: AsRef<str>>(raw: &str, extracts: &[S], options: &RenderOptions) -> Highlighted {
    let text = normalize_whitespace(raw);
    let mut unlocated = Vec::new();
    let spans = spans::merge_with(&text, extracts, |index, extract| {
        tracing::debug!(index, extract, "extract not found in document text");
        unlocated.push(extract.to_string());
    });
    let html = render(&text, &spans, options);
    Highlighted {
        text,
        spans,
        html,
        unlocated,
    }
}

fn open_tag(options: &RenderOptions, anchored: bool) -> String {
    let class = html_escape::encode_double_quoted_attribute(&options.mark_class);
    if anchored {
        let id = html_escape::encode_double_quoted_attribute(&options.anchor_id);
        format!("<mark class=\"{class}\" id=\"{id}\">")
    } else {
        format!("<mark class=\"{class}\">")
    }
}

fn escape(segment: &str) -> String {
    html_escape::encode_text(segment).into_owned()
}
