//! The codebook: an ordered table of extracts, plus its per-code counter.
//!
//! Rows keep insertion order; that order decides which extract is the
//! "latest" when a document is rendered. Every row has the five core
//! columns and the same list of user-added columns; [`Codebook::add_column`]
//! and [`Codebook::remove_column`] change all rows together.
//!
//! Mutating methods return whether anything changed. Preconditions that do
//! not hold (blank text, no selection, unknown row or column) make the call a
//! no-op rather than an error. The [`Counter`] is never patched in place; it
//! is rebuilt from the rows with [`Counter::tally`].

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{
    CodeCount, Extract, COL_CODE, COL_DOCUMENT_ID, COL_EXTRACT, COL_THEME, COL_TIMESTAMP,
    CORE_COLUMNS, DEFAULT_COLUMN_NAME,
};

/// Ordered extract rows with a uniform column set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codebook {
    extra_columns: Vec<String>,
    rows: Vec<Extract>,
}

impl Codebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a codebook from loaded rows.
    ///
    /// Each row's `extra` is padded or truncated to `extra_columns.len()`
    /// so the column set stays uniform.
    pub fn from_rows(extra_columns: Vec<String>, mut rows: Vec<Extract>) -> Self {
        for row in &mut rows {
            row.extra.resize(extra_columns.len(), String::new());
        }
        Self {
            extra_columns,
            rows,
        }
    }

    pub fn rows(&self) -> &[Extract] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Extract> {
        self.rows.get(row)
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// All column headers in file order: core columns, then extras.
    pub fn columns(&self) -> Vec<String> {
        CORE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Append an extract. Blank `text` is a no-op.
    ///
    /// `code` is normally the code selected in the counter view; `None`
    /// leaves the code empty. The theme always starts empty.
    pub fn add_extract(
        &mut self,
        text: &str,
        document_id: usize,
        code: Option<&str>,
        timestamp: String,
    ) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.rows.push(Extract {
            theme: String::new(),
            code: code.unwrap_or_default().to_string(),
            text: text.to_string(),
            document_id,
            timestamp,
            extra: vec![String::new(); self.extra_columns.len()],
        });
        true
    }

    /// Remove exactly one row. `None` or an out-of-range index is a no-op.
    pub fn delete_extract(&mut self, row: Option<usize>) -> Option<Extract> {
        let row = row?;
        if row >= self.rows.len() {
            return None;
        }
        Some(self.rows.remove(row))
    }

    /// Position of `column` in [`Codebook::columns`].
    ///
    /// Core headers win; a user column that repeats a core header is only
    /// reachable by position.
    pub fn column_position(&self, column: &str) -> Option<usize> {
        CORE_COLUMNS.iter().position(|c| *c == column).or_else(|| {
            self.extra_columns
                .iter()
                .position(|c| c == column)
                .map(|i| CORE_COLUMNS.len() + i)
        })
    }

    /// Overwrite one cell, addressed by column header.
    ///
    /// `Document_ID` only accepts positive integers. Unknown rows or
    /// columns are no-ops.
    pub fn edit_cell(&mut self, row: usize, column: &str, value: &str) -> bool {
        match self.column_position(column) {
            Some(position) => self.edit_cell_at(row, position, value),
            None => false,
        }
    }

    /// Overwrite one cell, addressed by its 0-based position in
    /// [`Codebook::columns`].
    pub fn edit_cell_at(&mut self, row: usize, column: usize, value: &str) -> bool {
        let Some(extract) = self.rows.get_mut(row) else {
            return false;
        };
        let Some(name) = CORE_COLUMNS.get(column) else {
            return match extract.extra.get_mut(column - CORE_COLUMNS.len()) {
                Some(cell) => {
                    *cell = value.to_string();
                    true
                }
                None => false,
            };
        };
        match *name {
            COL_THEME => extract.theme = value.to_string(),
            COL_CODE => extract.code = value.to_string(),
            COL_EXTRACT => extract.text = value.to_string(),
            COL_TIMESTAMP => extract.timestamp = value.to_string(),
            COL_DOCUMENT_ID => match value.trim().parse::<usize>() {
                Ok(id) if id >= 1 => extract.document_id = id,
                _ => return false,
            },
            _ => return false,
        }
        true
    }

    /// Replace the code of every row whose code is exactly `old`.
    ///
    /// Returns the number of rows renamed.
    pub fn rename_code(&mut self, old: &str, new: &str) -> usize {
        let mut renamed = 0;
        for extract in self.rows.iter_mut().filter(|e| e.code == old) {
            extract.code = new.to_string();
            renamed += 1;
        }
        renamed
    }

    /// Set the theme of every row whose code has an entry in `themes`.
    ///
    /// Returns the number of rows whose theme actually changed.
    pub fn assign_themes(&mut self, themes: &HashMap<String, String>) -> usize {
        let mut changed = 0;
        for extract in &mut self.rows {
            if let Some(theme) = themes.get(&extract.code) {
                if extract.theme != *theme {
                    extract.theme = theme.clone();
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Add a column to every row. A blank name becomes [`DEFAULT_COLUMN_NAME`].
    ///
    /// Returns the name actually used.
    pub fn add_column(&mut self, name: &str, default: &str) -> String {
        let name = if name.trim().is_empty() {
            DEFAULT_COLUMN_NAME.to_string()
        } else {
            name.to_string()
        };
        self.extra_columns.push(name.clone());
        for extract in &mut self.rows {
            extract.extra.push(default.to_string());
        }
        name
    }

    /// Remove the first user-added column called `name` from every row.
    ///
    /// Core columns cannot be removed; asking for one is a no-op.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(index) = self.extra_columns.iter().position(|c| c == name) else {
            return false;
        };
        self.extra_columns.remove(index);
        for extract in &mut self.rows {
            extract.extra.remove(index);
        }
        true
    }

    /// Extract texts of one document, in insertion order.
    pub fn extracts_for(&self, document_id: usize) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|e| e.document_id == document_id)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Row indices ordered by timestamp, newest first. Ties keep insertion
    /// order.
    pub fn order_by_timestamp_desc(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| self.rows[b].timestamp.cmp(&self.rows[a].timestamp));
        order
    }

    /// One row as cells in [`Codebook::columns`] order.
    pub fn row_cells(&self, row: usize) -> Option<Vec<String>> {
        let e = self.rows.get(row)?;
        let mut cells = vec![
            e.theme.clone(),
            e.code.clone(),
            e.text.clone(),
            e.document_id.to_string(),
            e.timestamp.clone(),
        ];
        cells.extend(e.extra.iter().cloned());
        Some(cells)
    }
}

/// Number of extracts per distinct code.
///
/// Entries are ordered by count, highest first, then by code. The empty
/// code (extracts not coded yet) is counted like any other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    entries: Vec<CodeCount>,
}

impl Counter {
    /// Grouped count over the live rows.
    pub fn tally(codebook: &Codebook) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for extract in codebook.rows() {
            *counts.entry(extract.code.as_str()).or_insert(0) += 1;
        }
        let mut entries: Vec<CodeCount> = counts
            .into_iter()
            .map(|(code, count)| CodeCount {
                code: code.to_string(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
        Self { entries }
    }

    pub fn entries(&self) -> &[CodeCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, code: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    /// Distinct codes in counter order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }
}
