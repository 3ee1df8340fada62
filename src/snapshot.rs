//! Codebook files on disk.
//!
//! The codebook is a CSV table with the header
//! `Theme,Code,Extract,Document_ID,Timestamp` followed by any user-added
//! columns. [`CsvSnapshot`] rewrites the whole file after every session
//! mutation. It writes a sibling temporary file first and renames it over
//! the target, so an interrupted write leaves the previous snapshot intact.

use anyhow::{bail, Context, Result};
use codemark_core::codebook::Codebook;
use codemark_core::models::{Extract, COL_CODE, COL_DOCUMENT_ID, COL_EXTRACT, COL_THEME, COL_TIMESTAMP};
use codemark_core::snapshot::SnapshotSink;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Snapshot sink that keeps a CSV file in step with the session.
pub struct CsvSnapshot {
    path: PathBuf,
}

impl CsvSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for CsvSnapshot {
    fn save(&self, codebook: &Codebook) -> Result<()> {
        let order: Vec<usize> = (0..codebook.len()).collect();
        write_atomic(&self.path, codebook, &order)?;
        tracing::debug!(rows = codebook.len(), path = %self.path.display(), "codebook snapshot written");
        Ok(())
    }
}

/// Read a codebook file. A missing file is an empty codebook.
pub fn load_codebook(path: &Path) -> Result<Codebook> {
    if !path.exists() {
        return Ok(Codebook::new());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open codebook: {}", path.display()))?;
    read_codebook(file).with_context(|| format!("Failed to read codebook: {}", path.display()))
}

/// Parse a codebook from CSV. Core columns may appear in any order; every
/// other column is kept, in file order.
pub fn read_codebook<R: std::io::Read>(input: R) -> Result<Codebook> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers = reader.headers()?.clone();

    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow::anyhow!("missing required column '{}'", name))
    };
    let theme = find(COL_THEME)?;
    let code = find(COL_CODE)?;
    let text = find(COL_EXTRACT)?;
    let document_id = find(COL_DOCUMENT_ID)?;
    let timestamp = find(COL_TIMESTAMP)?;

    // Only the first header of each core name is core; repeats are user
    // columns that happen to share the name.
    let core = [theme, code, text, document_id, timestamp];
    let extra_indices: Vec<usize> = (0..headers.len()).filter(|i| !core.contains(i)).collect();
    let extra_columns: Vec<String> = extra_indices
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or_default().to_string();
        let raw_id = cell(document_id);
        let id: usize = match raw_id.trim().parse::<f64>() {
            Ok(v) if v >= 1.0 && v.fract() == 0.0 => v as usize,
            _ => bail!(
                "row {}: Document_ID '{}' is not a positive integer",
                line + 1,
                raw_id
            ),
        };
        rows.push(Extract {
            theme: cell(theme),
            code: cell(code),
            text: cell(text),
            document_id: id,
            timestamp: cell(timestamp),
            extra: extra_indices.iter().map(|&i| cell(i)).collect(),
        });
    }

    Ok(Codebook::from_rows(extra_columns, rows))
}

/// Write the rows of `codebook` in `order` as CSV.
pub fn write_codebook<W: Write>(output: W, codebook: &Codebook, order: &[usize]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(codebook.columns())?;
    for &row in order {
        if let Some(cells) = codebook.row_cells(row) {
            writer.write_record(&cells)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write to `path` via a temporary sibling file and a rename.
pub fn write_atomic(path: &Path, codebook: &Codebook, order: &[usize]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let tmp = temp_path(path);
    let result = write_file(&tmp, codebook, order).and_then(|()| {
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace codebook: {}", path.display()))
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_file(path: &Path, codebook: &Codebook, order: &[usize]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut buffered = std::io::BufWriter::new(file);
    write_codebook(&mut buffered, codebook, order)?;
    let file = buffered
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush {}: {}", path.display(), e))?;
    file.sync_all()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "codebook.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}
