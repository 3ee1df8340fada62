//! Corpus and codebook overview.
//!
//! Gives a quick summary of how far coding has got: documents loaded,
//! extracts saved, distinct codes, and how the extracts spread over the
//! corpus. Used by `codemark stats`.

use anyhow::Result;
use chrono::{Local, NaiveDateTime, TimeZone};
use codemark_core::codebook::{Codebook, Counter};
use codemark_core::models::{Corpus, TIMESTAMP_FORMAT};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Per-document breakdown of extract counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub document_id: usize,
    pub extracts: usize,
    pub codes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub documents: usize,
    pub extracts: usize,
    pub distinct_codes: usize,
    pub uncoded_extracts: usize,
    pub coded_documents: usize,
    /// Rows whose `Document_ID` is outside the loaded corpus.
    pub orphaned_extracts: usize,
    pub last_extract: Option<String>,
    pub by_document: Vec<DocumentStats>,
}

pub fn collect_stats(corpus: &Corpus, codebook: &Codebook) -> Stats {
    let counter = Counter::tally(codebook);

    let mut per_doc: BTreeMap<usize, (usize, Vec<&str>)> = BTreeMap::new();
    for row in codebook.rows() {
        let entry = per_doc.entry(row.document_id).or_default();
        entry.0 += 1;
        if !row.code.is_empty() && !entry.1.contains(&row.code.as_str()) {
            entry.1.push(&row.code);
        }
    }

    let by_document: Vec<DocumentStats> = per_doc
        .iter()
        .map(|(&document_id, (extracts, codes))| DocumentStats {
            document_id,
            extracts: *extracts,
            codes: codes.len(),
        })
        .collect();

    let last_extract = codebook
        .order_by_timestamp_desc()
        .first()
        .and_then(|&row| codebook.get(row))
        .map(|row| row.timestamp.clone());

    Stats {
        documents: corpus.len(),
        extracts: codebook.len(),
        distinct_codes: counter.codes().filter(|c| !c.is_empty()).count(),
        uncoded_extracts: counter.count(""),
        coded_documents: by_document
            .iter()
            .filter(|d| corpus.contains_id(d.document_id))
            .count(),
        orphaned_extracts: codebook
            .rows()
            .iter()
            .filter(|r| !corpus.contains_id(r.document_id))
            .count(),
        last_extract,
        by_document,
    }
}

/// Print the stats as a table, or as JSON with `json`.
pub fn print_stats<W: Write>(mut out: W, stats: &Stats, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(stats)?)?;
        return Ok(());
    }

    writeln!(out, "Codemark Stats")?;
    writeln!(out, "==============")?;
    writeln!(out)?;
    writeln!(out, "  Documents:   {}", stats.documents)?;
    writeln!(
        out,
        "  Coded:       {} / {} ({}%)",
        stats.coded_documents,
        stats.documents,
        percent(stats.coded_documents, stats.documents)
    )?;
    writeln!(out, "  Extracts:    {}", stats.extracts)?;
    writeln!(out, "  Codes:       {}", stats.distinct_codes)?;
    writeln!(out, "  Uncoded:     {}", stats.uncoded_extracts)?;
    if stats.orphaned_extracts > 0 {
        writeln!(out, "  Orphaned:    {}", stats.orphaned_extracts)?;
    }
    let last = match &stats.last_extract {
        Some(ts) => format_ts_relative(ts),
        None => "never".to_string(),
    };
    writeln!(out, "  Last added:  {}", last)?;

    if !stats.by_document.is_empty() {
        writeln!(out)?;
        writeln!(out, "  By document:")?;
        writeln!(out, "  {:>8} {:>10} {:>8}", "DOC", "EXTRACTS", "CODES")?;
        writeln!(out, "  {}", "-".repeat(28))?;
        for d in &stats.by_document {
            writeln!(out, "  {:>8} {:>10} {:>8}", d.document_id, d.extracts, d.codes)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn percent(part: usize, whole: usize) -> usize {
    if whole > 0 {
        (part * 100) / whole
    } else {
        0
    }
}

/// Format a codebook timestamp as a relative time string (e.g. "3 hours ago").
///
/// Timestamps that do not parse are shown as stored.
fn format_ts_relative(ts: &str) -> String {
    let Some(at) = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).single())
    else {
        return ts.to_string();
    };
    let delta = (Local::now() - at).num_seconds();

    if delta < 0 {
        ts.to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        ts.to_string()
    }
}
