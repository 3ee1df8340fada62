//! Core data models shared by every codemark component.
//!
//! An [`Extract`] is one codebook row: a literal excerpt of a document plus
//! the analyst's metadata. Extracts carry no stored position; their location
//! is recomputed from `text` every time a document is rendered.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Column header for the theme field.
pub const COL_THEME: &str = "Theme";
/// Column header for the code field.
pub const COL_CODE: &str = "Code";
/// Column header for the extract text.
pub const COL_EXTRACT: &str = "Extract";
/// Column header for the 1-based document position.
pub const COL_DOCUMENT_ID: &str = "Document_ID";
/// Column header for the creation timestamp.
pub const COL_TIMESTAMP: &str = "Timestamp";

/// The fixed leading columns of every codebook file, in file order.
pub const CORE_COLUMNS: [&str; 5] = [
    COL_THEME,
    COL_CODE,
    COL_EXTRACT,
    COL_DOCUMENT_ID,
    COL_TIMESTAMP,
];

/// Name given to a new column when the caller leaves it blank.
pub const DEFAULT_COLUMN_NAME: &str = "Notes";

/// `strftime` layout of [`Extract::timestamp`]. Lexicographic order of
/// strings in this layout matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a point in time the way extract timestamps are stored.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One codebook row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extract {
    pub theme: String,
    pub code: String,
    /// Literal excerpt of the (whitespace-normalized) document text.
    pub text: String,
    /// 1-based position of the source document in the corpus.
    pub document_id: usize,
    pub timestamp: String,
    /// Values of user-added columns, aligned with the codebook's column list.
    pub extra: Vec<String>,
}

/// A highlighted byte range `[start, end)` of a normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    /// Set on the span holding the most recently added extract.
    pub is_latest: bool,
}

impl HighlightSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            is_latest: false,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// One row of the per-code aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCount {
    pub code: String,
    pub count: usize,
}

/// The ordered document collection under analysis.
///
/// Documents are addressed by 1-based position. A corpus is never edited in
/// place; loading new documents replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<String>,
}

impl Corpus {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document at 1-based position `id`.
    pub fn get(&self, id: usize) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|i| self.documents.get(i))
            .map(String::as_str)
    }

    pub fn contains_id(&self, id: usize) -> bool {
        id >= 1 && id <= self.documents.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }
}
