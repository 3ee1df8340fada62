//! # Codemark CLI (`codemark`)
//!
//! The `codemark` binary drives a coding session over a corpus. One-shot
//! subcommands load the corpus and codebook, apply a single change, and
//! exit. `codemark shell` keeps the session open for a stream of commands.
//!
//! ## Usage
//!
//! ```bash
//! codemark --config ./config/codemark.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `codemark render [N]` | Print document N with its extracts highlighted |
//! | `codemark add TEXT --doc N` | Save an extract from document N |
//! | `codemark delete ROW` | Delete a codebook row |
//! | `codemark edit ROW COLUMN VALUE` | Overwrite one cell |
//! | `codemark rename OLD NEW` | Rename a code on every row |
//! | `codemark column add/remove` | Manage user-added columns |
//! | `codemark counter` | Extracts per code |
//! | `codemark list` | Codebook rows with their numbers |
//! | `codemark export` | Codebook as CSV, newest first |
//! | `codemark stats` | Coding progress overview |
//! | `codemark shell` | Interactive command loop |
//! | `codemark completions <shell>` | Shell completion script |

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use codemark::config::{self, Config};
use codemark::shell::{self, Shell};
use codemark::{corpus, export, logging, snapshot, stats, view};
use codemark_core::session::{Session, TracingListener};
use std::io::{BufReader, Write};
use std::path::PathBuf;

/// Codemark: qualitative coding of text corpora.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/codemark.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "codemark",
    about = "Codemark: qualitative coding of text corpora",
    version,
    long_about = "Codemark steps through a corpus of documents, saves literal excerpts as \
    coded extracts, and keeps a CSV codebook in step with every change."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/codemark.toml`. Corpus, codebook, rendering,
    /// and logging settings are read from this file.
    #[arg(long, global = true, default_value = "./config/codemark.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Render one document with its extracts highlighted.
    ///
    /// Prints an HTML fragment where each extract is wrapped in a `<mark>`
    /// element. The most recent extract carries the anchor id when the
    /// document is long enough to need scrolling.
    Render {
        /// 1-based document number.
        #[arg(default_value_t = 1)]
        document: usize,

        /// Write the HTML fragment to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the normalized text, spans, and HTML as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save an extract from a document.
    ///
    /// The text must occur in the document, ignoring differences in
    /// whitespace.
    Add {
        /// Extract text.
        text: String,

        /// 1-based document number.
        #[arg(long, default_value_t = 1)]
        doc: usize,

        /// Code to tag the extract with.
        #[arg(long)]
        code: Option<String>,
    },

    /// Delete a codebook row (numbers as shown by `list`).
    Delete { row: usize },

    /// Overwrite one cell of the codebook.
    ///
    /// COLUMN is a header name, or `@N` for the N-th column (1-based),
    /// which reaches a user column that repeats a core header.
    Edit {
        row: usize,
        column: String,
        value: String,
    },

    /// Rename a code on every row that carries it.
    Rename { old: String, new: String },

    /// Add or remove user-defined codebook columns.
    Column {
        #[command(subcommand)]
        action: ColumnAction,
    },

    /// Show the number of extracts per code.
    Counter,

    /// List codebook rows with their numbers.
    List,

    /// Export the codebook as CSV, newest extract first.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show coding progress for the corpus.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run an interactive command loop over one session.
    ///
    /// Reads commands from stdin, or from `--script`. Type `help` for the
    /// command list.
    Shell {
        /// Read commands from this file instead of stdin.
        #[arg(long)]
        script: Option<PathBuf>,

        /// Do not re-render the document after each change.
        #[arg(long)]
        no_render: bool,
    },

    /// Print a shell completion script.
    Completions { shell: clap_complete::Shell },
}

/// Column subcommands.
#[derive(Subcommand)]
enum ColumnAction {
    /// Add a column to every row.
    Add {
        /// Column name. Defaults to `Notes`.
        #[arg(default_value = "")]
        name: String,

        /// Value for existing rows.
        #[arg(long, default_value = "")]
        default: String,
    },
    /// Remove a user-added column. Core columns cannot be removed.
    Remove { name: String },
}

/// Load the corpus and codebook named by `cfg` into a session that saves
/// to the codebook file.
fn open_session(cfg: &Config) -> Result<Session> {
    let documents = corpus::load_corpus(&cfg.corpus)?;
    let codebook = snapshot::load_codebook(&cfg.codebook.path)?;

    let mut session = Session::new(Box::new(snapshot::CsvSnapshot::new(&cfg.codebook.path)))
        .with_render_options(cfg.render.options());
    session.subscribe(Box::new(TracingListener));
    session.load_corpus(documents);
    session.load_codebook(codebook);
    Ok(session)
}

/// Convert a 1-based row number from the command line.
fn row_index(session: &Session, row: usize) -> Result<usize> {
    match row.checked_sub(1) {
        Some(index) if index < session.codebook().len() => Ok(index),
        _ => bail!(
            "No row {} (codebook has {} rows)",
            row,
            session.codebook().len()
        ),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "codemark", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging);
    let mut session = open_session(&cfg)?;
    let stdout = std::io::stdout();

    match cli.command {
        Commands::Render {
            document,
            output,
            json,
        } => {
            let Some(doc_view) = session.view(document) else {
                bail!(
                    "No document {} (corpus has {} documents)",
                    document,
                    session.corpus().len()
                );
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&doc_view)?);
            } else if let Some(path) = output {
                std::fs::write(&path, &doc_view.highlighted.html)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Rendered document {} to {}", document, path.display());
            } else {
                view::print_view(stdout.lock(), &doc_view)?;
            }
        }
        Commands::Add { text, doc, code } => {
            if !session.corpus().contains_id(doc) {
                bail!(
                    "No document {} (corpus has {} documents)",
                    doc,
                    session.corpus().len()
                );
            }
            session.jump_to(doc as i64);
            let added = match code.as_deref() {
                Some(code) => session.add_coded_extract(&text, Some(code))?,
                None => session.add_extract(&text)?,
            };
            if !added {
                bail!("Text not found in document {}: \"{}\"", doc, text);
            }
            println!("Added row {}", session.codebook().len());
        }
        Commands::Delete { row } => {
            let index = row_index(&session, row)?;
            if let Some(removed) = session.delete_extract(Some(index))? {
                println!("Deleted row {}: \"{}\"", row, removed.text);
            }
        }
        Commands::Edit { row, column, value } => {
            let index = row_index(&session, row)?;
            let edited = match shell::column_position(&column) {
                Some(position) => session.edit_cell_at(index, position, &value)?,
                None => session.edit_cell(index, &column, &value)?,
            };
            if !edited {
                bail!("Cannot set {} of row {} to '{}'", column, row, value);
            }
        }
        Commands::Rename { old, new } => {
            let rows = session.rename_code(&old, &new)?;
            println!("Renamed {} rows", rows);
        }
        Commands::Column { action } => match action {
            ColumnAction::Add { name, default } => {
                let name = session.add_column(&name, &default)?;
                println!("Added column {}", name);
            }
            ColumnAction::Remove { name } => {
                if !session.remove_column(&name)? {
                    bail!("No removable column named '{}'", name);
                }
            }
        },
        Commands::Counter => {
            view::print_counter(stdout.lock(), session.counter(), None)?;
        }
        Commands::List => {
            view::print_codebook(stdout.lock(), session.codebook())?;
        }
        Commands::Export { output } => {
            export::export_codebook(session.codebook(), output.as_deref())?;
        }
        Commands::Stats { json } => {
            let stats = stats::collect_stats(session.corpus(), session.codebook());
            stats::print_stats(stdout.lock(), &stats, json)?;
        }
        Commands::Shell { script, no_render } => {
            let interactive = script.is_none() && atty::is(atty::Stream::Stdin);
            let mut out = stdout.lock();
            let mut shell = Shell::new(&mut session, &cfg, &mut out, interactive && !no_render);
            match script {
                Some(path) => {
                    let file = std::fs::File::open(&path)
                        .with_context(|| format!("Failed to open script: {}", path.display()))?;
                    shell.run(BufReader::new(file), false)?;
                }
                None => shell.run(std::io::stdin().lock(), interactive)?,
            }
            out.flush()?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
