//! One analyst session: corpus, codebook, counter, navigator and themes.
//!
//! [`Session`] owns every piece of mutable state and is the only way to
//! change it. Commands run one at a time to completion; there is no
//! locking, because nothing else ever holds the state.
//!
//! # Change events
//!
//! Every codebook mutation goes through the same path:
//!
//! 1. the [`Codebook`] is changed,
//! 2. the [`Counter`] is rebuilt from the live rows,
//! 3. the whole codebook is handed to the [`SnapshotSink`] (a failed save is
//!    returned to the caller),
//! 4. listeners receive [`SessionEvent::CodebookChanged`].
//!
//! Navigation emits [`SessionEvent::DocumentChanged`] when the index moves,
//! and rendering emits [`SessionEvent::ExtractUnlocated`] for each saved
//! extract that can no longer be found in its document. Listeners decide
//! what to do with these; by default nothing is shown to the user.

use std::rc::Rc;

use anyhow::Result;
use serde::Serialize;

use crate::codebook::{Codebook, Counter};
use crate::models::{format_timestamp, Corpus, Extract, COL_DOCUMENT_ID, CORE_COLUMNS};
use crate::navigator::Navigator;
use crate::render::{self, normalize_whitespace, Highlighted, RenderOptions};
use crate::snapshot::{NoSnapshot, SnapshotSink};
use crate::themes::{ThemeBoard, ThemeTable};

/// What a codebook mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Codebook replaced wholesale from a file.
    Loaded { rows: usize },
    Added { row: usize },
    Deleted { row: usize },
    CellEdited { row: usize, column: String },
    Renamed { old: String, new: String, rows: usize },
    ColumnAdded { name: String },
    ColumnRemoved { name: String },
    ThemesApplied { rows: usize },
}

/// Signals emitted by a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CorpusLoaded { documents: usize },
    CodebookChanged(ChangeKind),
    DocumentChanged { index: usize },
    ExtractUnlocated { document_id: usize, text: String },
}

/// Observer of session events.
pub trait SessionListener {
    fn on_event(&self, event: &SessionEvent);
}

impl<T: SessionListener + ?Sized> SessionListener for Rc<T> {
    fn on_event(&self, event: &SessionEvent) {
        (**self).on_event(event)
    }
}

/// Logs every event through `tracing`.
pub struct TracingListener;

impl SessionListener for TracingListener {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::ExtractUnlocated { document_id, text } => {
                tracing::debug!(document_id, text = %text, "extract not located");
            }
            SessionEvent::CodebookChanged(kind) => {
                tracing::debug!(?kind, "codebook changed");
            }
            other => tracing::trace!(event = ?other, "session event"),
        }
    }
}

/// The rendered state of the current document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    /// 1-based index of the document.
    pub index: usize,
    /// Number of documents in the corpus.
    pub total: usize,
    /// Number of codebook rows that belong to this document.
    pub extracts: usize,
    #[serde(flatten)]
    pub highlighted: Highlighted,
}

/// Source of extract timestamps.
pub type Clock = Box<dyn Fn() -> String>;

fn local_clock() -> String {
    format_timestamp(chrono::Local::now())
}

/// Owned session state plus the snapshot sink and listeners.
pub struct Session {
    corpus: Corpus,
    codebook: Codebook,
    counter: Counter,
    navigator: Option<Navigator>,
    selected_code: Option<String>,
    themes: Option<ThemeBoard>,
    render: RenderOptions,
    sink: Box<dyn SnapshotSink>,
    listeners: Vec<Box<dyn SessionListener>>,
    clock: Clock,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Box::new(NoSnapshot))
    }
}

impl Session {
    /// An empty session that snapshots through `sink`.
    pub fn new(sink: Box<dyn SnapshotSink>) -> Self {
        Self {
            corpus: Corpus::default(),
            codebook: Codebook::new(),
            counter: Counter::default(),
            navigator: None,
            selected_code: None,
            themes: None,
            render: RenderOptions::default(),
            sink,
            listeners: Vec::new(),
            clock: Box::new(local_clock),
        }
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Replace the timestamp source (tests use a fixed sequence).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn subscribe(&mut self, listener: Box<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    pub fn selected_code(&self) -> Option<&str> {
        self.selected_code.as_deref()
    }

    /// 1-based index of the current document, if a corpus is loaded.
    pub fn current_index(&self) -> Option<usize> {
        self.navigator.map(|n| n.index())
    }

    fn emit(&self, event: SessionEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    /// Recompute the counter, snapshot, then notify.
    fn codebook_changed(&mut self, kind: ChangeKind) -> Result<()> {
        self.counter = Counter::tally(&self.codebook);
        if let Some(code) = &self.selected_code {
            if !self.counter.contains(code) {
                self.selected_code = None;
            }
        }
        self.sink.save(&self.codebook)?;
        self.emit(SessionEvent::CodebookChanged(kind));
        Ok(())
    }

    // ── Corpus & navigation ─────────────────────────────────────────────

    /// Replace the corpus. Navigation restarts at document 1.
    pub fn load_corpus(&mut self, documents: Vec<String>) {
        self.corpus = Corpus::new(documents);
        self.navigator = Navigator::new(self.corpus.len());
        let outside = self
            .codebook
            .rows()
            .iter()
            .filter(|e| !self.corpus.contains_id(e.document_id))
            .count();
        if outside > 0 && !self.corpus.is_empty() {
            tracing::warn!(outside, "codebook rows reference documents outside the corpus");
        }
        self.emit(SessionEvent::CorpusLoaded {
            documents: self.corpus.len(),
        });
        if let Some(nav) = self.navigator {
            self.emit(SessionEvent::DocumentChanged { index: nav.index() });
        }
    }

    /// Replace the codebook with one read from storage. No snapshot is
    /// written, since storage already holds it.
    pub fn load_codebook(&mut self, codebook: Codebook) {
        self.codebook = codebook;
        self.counter = Counter::tally(&self.codebook);
        self.selected_code = None;
        let outside = self
            .codebook
            .rows()
            .iter()
            .filter(|e| !self.corpus.contains_id(e.document_id))
            .count();
        if outside > 0 && !self.corpus.is_empty() {
            tracing::warn!(outside, "codebook rows reference documents outside the corpus");
        }
        self.emit(SessionEvent::CodebookChanged(ChangeKind::Loaded {
            rows: self.codebook.len(),
        }));
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Navigator) -> bool) -> bool {
        let Some(nav) = self.navigator.as_mut() else {
            return false;
        };
        if !step(nav) {
            return false;
        }
        let index = nav.index();
        self.emit(SessionEvent::DocumentChanged { index });
        true
    }

    pub fn next(&mut self) -> bool {
        self.navigate(Navigator::next)
    }

    pub fn prev(&mut self) -> bool {
        self.navigate(Navigator::prev)
    }

    /// Targets below 1 are ignored; targets past the end clamp.
    pub fn jump_to(&mut self, target: i64) -> bool {
        self.navigate(|nav| nav.jump_to(target))
    }

    /// Highlight pipeline for the current document.
    pub fn current_view(&self) -> Option<DocumentView> {
        let index = self.current_index()?;
        self.view(index)
    }

    /// Highlight pipeline for document `index` (1-based).
    pub fn view(&self, index: usize) -> Option<DocumentView> {
        let raw = self.corpus.get(index)?;
        let extracts = self.codebook.extracts_for(index);
        let highlighted = render::highlight(raw, &extracts, &self.render);
        for text in &highlighted.unlocated {
            self.emit(SessionEvent::ExtractUnlocated {
                document_id: index,
                text: text.clone(),
            });
        }
        Some(DocumentView {
            index,
            total: self.corpus.len(),
            extracts: extracts.len(),
            highlighted,
        })
    }

    // ── Counter selection ───────────────────────────────────────────────

    /// Select a counter row by code, or clear the selection with `None`.
    ///
    /// Only codes present in the counter can be selected.
    pub fn select_code(&mut self, code: Option<&str>) -> bool {
        match code {
            None => {
                self.selected_code = None;
                true
            }
            Some(code) if self.counter.contains(code) => {
                self.selected_code = Some(code.to_string());
                true
            }
            Some(_) => false,
        }
    }

    // ── Codebook mutations ──────────────────────────────────────────────

    /// Save `text` from the current document as a new extract.
    ///
    /// The code is the selected counter row's code, if any. Returns
    /// `Ok(false)` without touching anything when no corpus is loaded, the
    /// text is blank, or the text does not occur in the current document.
    pub fn add_extract(&mut self, text: &str) -> Result<bool> {
        let code = self.selected_code.clone();
        self.add_coded_extract(text, code.as_deref())
    }

    /// Like [`Session::add_extract`], with `code` in place of the
    /// selection. The row is created and saved in one step.
    pub fn add_coded_extract(&mut self, text: &str, code: Option<&str>) -> Result<bool> {
        let Some(index) = self.current_index() else {
            return Ok(false);
        };
        let text = normalize_whitespace(text);
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let document = self.corpus.get(index).map(normalize_whitespace);
        if !document.is_some_and(|d| d.contains(text)) {
            tracing::debug!(index, text, "extract text not found in current document");
            return Ok(false);
        }
        let timestamp = (self.clock)();
        if !self.codebook.add_extract(text, index, code, timestamp) {
            return Ok(false);
        }
        let row = self.codebook.len() - 1;
        self.codebook_changed(ChangeKind::Added { row })?;
        Ok(true)
    }

    /// Delete the selected row. `None` or an unknown row is a no-op.
    pub fn delete_extract(&mut self, row: Option<usize>) -> Result<Option<Extract>> {
        let Some(removed) = self.codebook.delete_extract(row) else {
            return Ok(None);
        };
        let row = row.unwrap_or_default();
        self.codebook_changed(ChangeKind::Deleted { row })?;
        Ok(Some(removed))
    }

    /// Edit one cell of the raw codebook view, addressed by header.
    ///
    /// With a corpus loaded, `Document_ID` must point into it.
    pub fn edit_cell(&mut self, row: usize, column: &str, value: &str) -> Result<bool> {
        match self.codebook.column_position(column) {
            Some(position) => self.edit_cell_at(row, position, value),
            None => Ok(false),
        }
    }

    /// Edit one cell addressed by its 0-based column position.
    pub fn edit_cell_at(&mut self, row: usize, column: usize, value: &str) -> Result<bool> {
        let is_document_id = CORE_COLUMNS.get(column) == Some(&COL_DOCUMENT_ID);
        if is_document_id && !self.corpus.is_empty() {
            let in_range = value
                .trim()
                .parse::<usize>()
                .is_ok_and(|id| self.corpus.contains_id(id));
            if !in_range {
                return Ok(false);
            }
        }
        if !self.codebook.edit_cell_at(row, column, value) {
            return Ok(false);
        }
        let column = self.codebook.columns().swap_remove(column);
        self.codebook_changed(ChangeKind::CellEdited { row, column })?;
        Ok(true)
    }

    /// Rename a code everywhere, as done from the counter view.
    ///
    /// The selection and the theme buckets follow the rename. Returns the
    /// number of rows renamed.
    pub fn rename_code(&mut self, old: &str, new: &str) -> Result<usize> {
        if old == new {
            return Ok(0);
        }
        let rows = self.codebook.rename_code(old, new);
        if rows == 0 {
            return Ok(0);
        }
        if self.selected_code.as_deref() == Some(old) {
            self.selected_code = Some(new.to_string());
        }
        if let Some(board) = self.themes.as_mut() {
            board.rename_code(old, new);
        }
        self.codebook_changed(ChangeKind::Renamed {
            old: old.to_string(),
            new: new.to_string(),
            rows,
        })?;
        Ok(rows)
    }

    /// Add a column to every row; returns the name used.
    pub fn add_column(&mut self, name: &str, default: &str) -> Result<String> {
        let name = self.codebook.add_column(name, default);
        self.codebook_changed(ChangeKind::ColumnAdded { name: name.clone() })?;
        Ok(name)
    }

    pub fn remove_column(&mut self, name: &str) -> Result<bool> {
        if !self.codebook.remove_column(name) {
            return Ok(false);
        }
        self.codebook_changed(ChangeKind::ColumnRemoved {
            name: name.to_string(),
        })?;
        Ok(true)
    }

    // ── Themes ──────────────────────────────────────────────────────────

    /// The theme board, seeded from the counter on first use.
    pub fn themes(&mut self) -> &ThemeBoard {
        self.themes
            .get_or_insert_with(|| ThemeBoard::seed(self.counter.codes()))
    }

    fn themes_mut(&mut self) -> &mut ThemeBoard {
        self.themes
            .get_or_insert_with(|| ThemeBoard::seed(self.counter.codes()))
    }

    /// Accept the full arrangement from the sorting view.
    pub fn set_partition(&mut self, partition: Vec<Vec<String>>) {
        self.themes_mut().set_partition(partition);
    }

    /// Commit `live` (if any), then append an empty group.
    pub fn add_bucket(&mut self, live: Option<Vec<Vec<String>>>) -> usize {
        self.themes_mut().add_bucket(live)
    }

    pub fn rename_bucket(&mut self, position: usize, name: &str) -> bool {
        self.themes_mut().rename_bucket(position, name)
    }

    /// Put codes created since seeding into the first group.
    pub fn refresh_themes(&mut self) -> usize {
        let codes: Vec<String> = self.counter.codes().map(str::to_string).collect();
        self.themes_mut()
            .absorb_new_codes(codes.iter().map(String::as_str))
    }

    pub fn export_themes(&mut self) -> ThemeTable {
        self.themes().export()
    }

    /// Write each code's group name into the Theme column.
    pub fn apply_themes(&mut self) -> Result<usize> {
        let assignments = self.themes().assignments();
        let rows = self.codebook.assign_themes(&assignments);
        if rows > 0 {
            self.codebook_changed(ChangeKind::ThemesApplied { rows })?;
        }
        Ok(rows)
    }
}
