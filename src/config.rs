use anyhow::{Context, Result};
use codemark_core::render::{RenderOptions, DEFAULT_SCROLL_THRESHOLD};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub codebook: CodebookConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub themes: ThemesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the corpus file or directory is split into documents.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CorpusFormat {
    /// One document per non-empty line.
    Lines,
    /// One document per matching file under a directory.
    Directory,
    /// One document per row, taken from a named column.
    Csv,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub path: PathBuf,
    #[serde(default = "default_format")]
    pub format: CorpusFormat,
    /// Column holding the document text (csv only).
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_format() -> CorpusFormat {
    CorpusFormat::Lines
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CodebookConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "default_mark_class")]
    pub mark_class: String,
    #[serde(default = "default_anchor_id")]
    pub anchor_id: String,
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mark_class: default_mark_class(),
            anchor_id: default_anchor_id(),
            scroll_threshold: default_scroll_threshold(),
        }
    }
}

fn default_mark_class() -> String {
    "extract".to_string()
}
fn default_anchor_id() -> String {
    "latest-extract".to_string()
}
fn default_scroll_threshold() -> usize {
    DEFAULT_SCROLL_THRESHOLD
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            mark_class: self.mark_class.clone(),
            anchor_id: self.anchor_id.clone(),
            scroll_threshold: self.scroll_threshold,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ThemesConfig {
    /// Default destination of `themes export`.
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Defaults relative to the working directory, for commands that can
    /// run without a config file.
    pub fn minimal() -> Self {
        Self {
            corpus: CorpusConfig {
                path: PathBuf::from("./data/corpus.txt"),
                format: default_format(),
                column: None,
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            codebook: CodebookConfig {
                path: PathBuf::from("./data/codebook.csv"),
            },
            render: RenderConfig::default(),
            themes: ThemesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.format == CorpusFormat::Csv
        && config
            .corpus
            .column
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    {
        anyhow::bail!("corpus.column must be set when corpus.format is 'csv'");
    }
    if config.corpus.format == CorpusFormat::Directory && config.corpus.include_globs.is_empty() {
        anyhow::bail!("corpus.include_globs must not be empty for 'directory' corpora");
    }

    // Validate render
    if config.render.mark_class.trim().is_empty() {
        anyhow::bail!("render.mark_class must not be empty");
    }
    if config.render.anchor_id.trim().is_empty() {
        anyhow::bail!("render.anchor_id must not be empty");
    }

    match config.logging.level.to_ascii_lowercase().as_str() {
        "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
        other => anyhow::bail!(
            "Unknown logging level: '{}'. Must be error, warn, info, debug, trace, or off.",
            other
        ),
    }

    Ok(config)
}
