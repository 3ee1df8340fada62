//! Corpus loading.
//!
//! Turns the configured source into the ordered list of document texts the
//! session works on. Document positions are stable for a given source: lines
//! keep file order, directory entries are sorted by relative path, CSV rows
//! keep row order.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{CorpusConfig, CorpusFormat};

pub fn load_corpus(config: &CorpusConfig) -> Result<Vec<String>> {
    let path = &config.path;
    if !path.exists() {
        bail!("Corpus path does not exist: {}", path.display());
    }

    let documents = match config.format {
        CorpusFormat::Lines => load_lines(path)?,
        CorpusFormat::Directory => load_directory(config)?,
        CorpusFormat::Csv => {
            let column = config
                .column
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("corpus.column is required for csv corpora"))?;
            load_csv_column(path, column)?
        }
    };

    tracing::info!(
        documents = documents.len(),
        path = %path.display(),
        "corpus loaded"
    );
    Ok(documents)
}

fn load_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn load_directory(config: &CorpusConfig) -> Result<Vec<String>> {
    let root = &config.path;
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        files.push((rel_str, path.to_path_buf()));
    }

    // Sort for deterministic document positions
    files.sort_by(|a, b| a.0.cmp(&b.0));

    files
        .into_iter()
        .map(|(_, path)| {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read document: {}", path.display()))
        })
        .collect()
}

fn load_csv_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {}", column, path.display()))?;

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record?;
        let text = record.get(index).unwrap_or_default();
        if !text.trim().is_empty() {
            documents.push(text.to_string());
        }
    }
    Ok(documents)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn corpus_config(path: PathBuf, format: CorpusFormat) -> CorpusConfig {
        CorpusConfig {
            path,
            format,
            column: None,
            include_globs: vec!["**/*.txt".to_string()],
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }

    #[test]
    fn lines_skip_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus.txt");
        fs::write(&path, "first doc\n\n  second doc  \n").unwrap();
        let docs = load_corpus(&corpus_config(path, CorpusFormat::Lines)).unwrap();
        assert_eq!(docs, vec!["first doc", "second doc"]);
    }

    #[test]
    fn directory_is_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("docs");
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.txt"), "bravo").unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("nested/c.txt"), "charlie").unwrap();
        fs::write(root.join("skip.pdf"), "binary").unwrap();
        let docs = load_corpus(&corpus_config(root, CorpusFormat::Directory)).unwrap();
        assert_eq!(docs, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn csv_column_by_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("responses.csv");
        fs::write(
            &path,
            "id,response\n1,\"I liked it, mostly\"\n2,\n3,\"Too long\nand slow\"\n",
        )
        .unwrap();
        let mut config = corpus_config(path, CorpusFormat::Csv);
        config.column = Some("response".to_string());
        let docs = load_corpus(&config).unwrap();
        assert_eq!(docs, vec!["I liked it, mostly", "Too long\nand slow"]);
    }

    #[test]
    fn missing_csv_column_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("responses.csv");
        fs::write(&path, "id,answer\n1,x\n").unwrap();
        let mut config = corpus_config(path, CorpusFormat::Csv);
        config.column = Some("response".to_string());
        let err = load_corpus(&config).unwrap_err();
        assert!(err.to_string().contains("Column 'response' not found"));
    }

    #[test]
    fn missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = corpus_config(tmp.path().join("nope.txt"), CorpusFormat::Lines);
        assert!(load_corpus(&config).is_err());
    }
}
