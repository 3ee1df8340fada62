//! Plain-text presentation of session state.
//!
//! Shared by the one-shot subcommands and the shell. Everything writes to a
//! caller-supplied [`Write`] so output can be captured in tests.

use anyhow::Result;
use codemark_core::codebook::{Codebook, Counter};
use codemark_core::session::DocumentView;
use codemark_core::themes::ThemeBoard;
use std::io::Write;

const EXTRACT_WIDTH: usize = 48;

/// Print the header line and highlighted HTML of one document.
pub fn print_view<W: Write>(mut out: W, view: &DocumentView) -> Result<()> {
    writeln!(
        out,
        "Document {}/{} ({} extract{})",
        view.index,
        view.total,
        view.extracts,
        if view.extracts == 1 { "" } else { "s" }
    )?;
    writeln!(out, "{}", view.highlighted.html)?;
    for text in &view.highlighted.unlocated {
        writeln!(out, "  not found in document: \"{}\"", truncate(text, EXTRACT_WIDTH))?;
    }
    Ok(())
}

/// Print extract counts per code. The selected code is starred.
pub fn print_counter<W: Write>(mut out: W, counter: &Counter, selected: Option<&str>) -> Result<()> {
    if counter.is_empty() {
        writeln!(out, "No extracts yet.")?;
        return Ok(());
    }
    writeln!(out, "  {:<32} {:>6}", "CODE", "COUNT")?;
    writeln!(out, "  {}", "-".repeat(39))?;
    for entry in counter.entries() {
        let marker = if selected == Some(entry.code.as_str()) { '*' } else { ' ' };
        let code = if entry.code.is_empty() { "(uncoded)" } else { &entry.code };
        writeln!(out, "{} {:<32} {:>6}", marker, code, entry.count)?;
    }
    Ok(())
}

/// Print codebook rows with the 1-based numbers that row commands take.
pub fn print_codebook<W: Write>(mut out: W, codebook: &Codebook) -> Result<()> {
    if codebook.is_empty() {
        writeln!(out, "No extracts yet.")?;
        return Ok(());
    }
    writeln!(
        out,
        "  {:>4} {:>4}  {:<16} {:<16} {:<20} EXTRACT",
        "ROW", "DOC", "CODE", "THEME", "TIMESTAMP"
    )?;
    writeln!(out, "  {}", "-".repeat(110))?;
    for (i, row) in codebook.rows().iter().enumerate() {
        writeln!(
            out,
            "  {:>4} {:>4}  {:<16} {:<16} {:<20} {}",
            i + 1,
            row.document_id,
            truncate(&row.code, 16),
            truncate(&row.theme, 16),
            row.timestamp,
            truncate(&row.text, EXTRACT_WIDTH)
        )?;
    }
    if !codebook.extra_columns().is_empty() {
        writeln!(out)?;
        writeln!(out, "  Extra columns: {}", codebook.extra_columns().join(", "))?;
    }
    Ok(())
}

/// Print each theme bucket on its own line.
pub fn print_themes<W: Write>(mut out: W, board: &ThemeBoard) -> Result<()> {
    for (i, group) in board.groups().iter().enumerate() {
        writeln!(out, "  {}. {}: {}", i + 1, group.name, group.codes.join(", "))?;
    }
    Ok(())
}

/// Shorten `text` to at most `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
