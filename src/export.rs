//! Export the codebook and theme table as CSV.
//!
//! The codebook export has the same schema as the snapshot file, sorted by
//! timestamp with the newest extract first. The theme export has one column
//! per theme, padded with empty cells to the longest theme.

use anyhow::{Context, Result};
use codemark_core::codebook::Codebook;
use codemark_core::themes::ThemeTable;
use std::io::Write;
use std::path::Path;

use crate::snapshot;

/// Export the codebook, newest first.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub fn export_codebook(codebook: &Codebook, output: Option<&Path>) -> Result<()> {
    let order = codebook.order_by_timestamp_desc();
    match output {
        Some(path) => {
            snapshot::write_atomic(path, codebook, &order)?;
            eprintln!("Exported {} extracts to {}", codebook.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            snapshot::write_codebook(stdout.lock(), codebook, &order)?;
        }
    }
    Ok(())
}

/// Write a theme table as CSV.
pub fn write_themes<W: Write>(output: W, table: &ThemeTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export the theme table to `output`, or stdout when `None`.
pub fn export_themes(table: &ThemeTable, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_themes(file, table)?;
            eprintln!(
                "Exported {} themes ({} rows) to {}",
                table.headers.len(),
                table.rows.len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_themes(stdout.lock(), table)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemark_core::themes::ThemeBoard;

    #[test]
    fn theme_table_is_rectangular_csv() {
        let mut board = ThemeBoard::seed(["a", "b", "c", "d"]);
        board.set_partition(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec!["d".into()],
            vec![],
        ]);
        let mut out = Vec::new();
        write_themes(&mut out, &board.export()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Theme 1,Theme 2,Theme 3\na,d,\nb,,\nc,,\n");
    }

    #[test]
    fn export_codebook_to_file_is_newest_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out").join("codebook.csv");
        let mut cb = Codebook::new();
        cb.add_extract("older", 1, None, "2024-01-01 00:00:00".into());
        cb.add_extract("newer", 1, None, "2024-06-01 00:00:00".into());
        export_codebook(&cb, Some(path.as_path())).unwrap();
        let loaded = snapshot::load_codebook(&path).unwrap();
        assert_eq!(loaded.get(0).unwrap().text, "newer");
        assert_eq!(loaded.get(1).unwrap().text, "older");
    }
}
