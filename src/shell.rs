//! Line-oriented command surface over one [`Session`].
//!
//! `codemark shell` reads commands from stdin (or a script file), one per
//! line, and runs each to completion before reading the next. Arguments are
//! split shell-style, so quoted extracts may contain spaces:
//!
//! ```text
//! jump 3
//! add "the new manager"
//! select Trust
//! rename Trust "Trust in leadership"
//! themes set "Trust in leadership,Cost" "Workload"
//! themes export themes.csv
//! ```
//!
//! Row numbers are 1-based, as shown by `list`. Commands whose
//! preconditions do not hold (no corpus, unknown row, blank text) do
//! nothing and print nothing. Unknown commands print a hint. I/O failures
//! end the shell with an error.

use anyhow::Result;
use codemark_core::session::{Session, SessionEvent, SessionListener};
use std::cell::Cell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::Config;
use crate::export;
use crate::view;

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Next,
    Prev,
    Jump(i64),
    Add(String),
    Select(Option<String>),
    Delete(Option<usize>),
    Edit {
        row: Option<usize>,
        column: String,
        value: String,
    },
    Rename {
        old: String,
        new: String,
    },
    AddColumn {
        name: String,
        default: String,
    },
    RemoveColumn(String),
    Counter,
    List,
    Themes,
    ThemesAdd,
    ThemesSet(Vec<Vec<String>>),
    ThemesRename {
        position: Option<usize>,
        name: String,
    },
    ThemesRefresh,
    ThemesApply,
    ThemesExport(Option<PathBuf>),
    Export(Option<PathBuf>),
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  show                          render the current document
  next | prev | jump N          move between documents
  add TEXT                      save TEXT from the current document as an extract
  select CODE | select -        pick the code new extracts get, or clear it
  delete ROW                    delete a codebook row
  edit ROW COLUMN VALUE         overwrite one cell (COLUMN may be @N)
  rename OLD NEW                rename a code on every row
  add-column [NAME] [DEFAULT]   add a column (default name: Notes)
  remove-column NAME            remove a user-added column
  counter                       extracts per code
  list                          codebook rows with their numbers
  themes                        show theme buckets
  themes add                    append an empty theme
  themes set G1 G2 ...          replace all buckets (codes comma-separated)
  themes rename N NAME          rename theme N
  themes refresh                put new codes into the first theme
  themes apply                  write theme names into the Theme column
  themes export [PATH]          write the theme table as CSV
  export [PATH]                 write the codebook as CSV, newest first
  help | quit";

/// Parse 1-based row numbers; anything else selects nothing.
fn parse_row(arg: Option<&String>) -> Option<usize> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
}

/// `@N` names the N-th column (1-based) instead of a header.
pub fn column_position(arg: &str) -> Option<usize> {
    arg.strip_prefix('@')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
}

fn parse_group(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let args = shlex::split(trimmed).ok_or_else(|| format!("unbalanced quotes: {trimmed}"))?;
    let Some((name, rest)) = args.split_first() else {
        return Ok(None);
    };

    let command = match (name.as_str(), rest) {
        ("show", []) => Command::Show,
        ("next", []) => Command::Next,
        ("prev", []) => Command::Prev,
        ("jump", [n]) => Command::Jump(
            n.parse()
                .map_err(|_| format!("jump expects a number, got '{n}'"))?,
        ),
        ("add", [_, ..]) => Command::Add(rest.join(" ")),
        ("select", [code]) if code == "-" => Command::Select(None),
        ("select", [code]) => Command::Select(Some(code.clone())),
        ("delete", [row]) => Command::Delete(parse_row(Some(row))),
        ("edit", [row, column, value]) => Command::Edit {
            row: parse_row(Some(row)),
            column: column.clone(),
            value: value.clone(),
        },
        ("rename", [old, new]) => Command::Rename {
            old: old.clone(),
            new: new.clone(),
        },
        ("add-column", []) => Command::AddColumn {
            name: String::new(),
            default: String::new(),
        },
        ("add-column", [name]) => Command::AddColumn {
            name: name.clone(),
            default: String::new(),
        },
        ("add-column", [name, default]) => Command::AddColumn {
            name: name.clone(),
            default: default.clone(),
        },
        ("remove-column", [name]) => Command::RemoveColumn(name.clone()),
        ("counter", []) => Command::Counter,
        ("list", []) => Command::List,
        ("themes", []) => Command::Themes,
        ("themes", [sub, tail @ ..]) => match (sub.as_str(), tail) {
            ("add", []) => Command::ThemesAdd,
            ("set", groups) => Command::ThemesSet(groups.iter().map(|g| parse_group(g)).collect()),
            ("rename", [n, name]) => Command::ThemesRename {
                position: parse_row(Some(n)),
                name: name.clone(),
            },
            ("refresh", []) => Command::ThemesRefresh,
            ("apply", []) => Command::ThemesApply,
            ("export", []) => Command::ThemesExport(None),
            ("export", [path]) => Command::ThemesExport(Some(PathBuf::from(path))),
            _ => return Err(format!("unknown themes command: {trimmed}")),
        },
        ("export", []) => Command::Export(None),
        ("export", [path]) => Command::Export(Some(PathBuf::from(path))),
        ("help", _) => Command::Help,
        ("quit", []) | ("exit", []) => Command::Quit,
        _ => return Err(format!("unknown command: {trimmed} (try 'help')")),
    };
    Ok(Some(command))
}

/// Marks the view stale on navigation and codebook changes.
struct RenderTrigger {
    stale: Rc<Cell<bool>>,
}

impl SessionListener for RenderTrigger {
    fn on_event(&self, event: &SessionEvent) {
        if matches!(
            event,
            SessionEvent::DocumentChanged { .. } | SessionEvent::CodebookChanged(_)
        ) {
            self.stale.set(true);
        }
    }
}

/// Drives a session from a stream of command lines.
pub struct Shell<'a, W: Write> {
    session: &'a mut Session,
    config: &'a Config,
    out: W,
    /// Re-render the current document after commands that change it.
    auto_render: bool,
    stale: Rc<Cell<bool>>,
}

impl<'a, W: Write> Shell<'a, W> {
    pub fn new(session: &'a mut Session, config: &'a Config, out: W, auto_render: bool) -> Self {
        let stale = Rc::new(Cell::new(false));
        session.subscribe(Box::new(RenderTrigger {
            stale: stale.clone(),
        }));
        Self {
            session,
            config,
            out,
            auto_render,
            stale,
        }
    }

    /// Run every line of `input`. Returns when input ends or on `quit`.
    pub fn run<R: BufRead>(&mut self, input: R, prompt: bool) -> Result<()> {
        if prompt {
            self.prompt()?;
        }
        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    self.stale.set(false);
                    self.execute(command)?;
                    if self.auto_render && self.stale.get() {
                        self.show()?;
                    }
                }
                Err(message) => writeln!(self.out, "{message}")?,
            }
            if prompt {
                self.prompt()?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        match self.session.current_index() {
            Some(i) => write!(self.out, "[{}/{}]> ", i, self.session.corpus().len())?,
            None => write!(self.out, "> ")?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        if let Some(view) = self.session.current_view() {
            view::print_view(&mut self.out, &view)?;
        }
        Ok(())
    }

    /// Run one command against the session.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Show => self.show()?,
            Command::Next => {
                self.session.next();
            }
            Command::Prev => {
                self.session.prev();
            }
            Command::Jump(n) => {
                self.session.jump_to(n);
            }
            Command::Add(text) => {
                if self.session.add_extract(&text)? {
                    writeln!(self.out, "added row {}", self.session.codebook().len())?;
                }
            }
            Command::Select(code) => {
                self.session.select_code(code.as_deref());
            }
            Command::Delete(row) => {
                if let Some(removed) = self.session.delete_extract(row)? {
                    writeln!(self.out, "deleted \"{}\"", removed.text)?;
                }
            }
            Command::Edit { row, column, value } => {
                if let Some(row) = row {
                    match column_position(&column) {
                        Some(position) => self.session.edit_cell_at(row, position, &value)?,
                        None => self.session.edit_cell(row, &column, &value)?,
                    };
                }
            }
            Command::Rename { old, new } => {
                let rows = self.session.rename_code(&old, &new)?;
                if rows > 0 {
                    writeln!(self.out, "renamed {rows} rows")?;
                }
            }
            Command::AddColumn { name, default } => {
                let name = self.session.add_column(&name, &default)?;
                writeln!(self.out, "added column {name}")?;
            }
            Command::RemoveColumn(name) => {
                self.session.remove_column(&name)?;
            }
            Command::Counter => {
                view::print_counter(
                    &mut self.out,
                    self.session.counter(),
                    self.session.selected_code(),
                )?;
            }
            Command::List => view::print_codebook(&mut self.out, self.session.codebook())?,
            Command::Themes => {
                let board = self.session.themes().clone();
                view::print_themes(&mut self.out, &board)?;
            }
            Command::ThemesAdd => {
                let position = self.session.add_bucket(None);
                writeln!(self.out, "added theme {}", position + 1)?;
            }
            Command::ThemesSet(partition) => self.session.set_partition(partition),
            Command::ThemesRename { position, name } => {
                if let Some(position) = position {
                    self.session.rename_bucket(position, &name);
                }
            }
            Command::ThemesRefresh => {
                let added = self.session.refresh_themes();
                if added > 0 {
                    writeln!(self.out, "added {added} codes to the first theme")?;
                }
            }
            Command::ThemesApply => {
                let rows = self.session.apply_themes()?;
                writeln!(self.out, "themed {rows} rows")?;
            }
            Command::ThemesExport(path) => {
                let table = self.session.export_themes();
                let path = path.or_else(|| self.config.themes.export_path.clone());
                match path {
                    Some(path) => export::export_themes(&table, Some(path.as_path()))?,
                    None => export::write_themes(&mut self.out, &table)?,
                }
            }
            Command::Export(path) => match path {
                Some(path) => export::export_codebook(self.session.codebook(), Some(path.as_path()))?,
                None => {
                    let codebook = self.session.codebook();
                    crate::snapshot::write_codebook(
                        &mut self.out,
                        codebook,
                        &codebook.order_by_timestamp_desc(),
                    )?
                }
            },
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemark_core::snapshot::MemorySnapshot;

    fn run(script: &str) -> (Session, String) {
        let config = Config::minimal();
        let mut session = Session::new(Box::new(MemorySnapshot::new()));
        session.load_corpus(vec![
            "Staff said the rota (weekends) was unfair.".to_string(),
            "Pay was fine. Training was rushed.".to_string(),
        ]);
        let mut out = Vec::new();
        Shell::new(&mut session, &config, &mut out, false)
            .run(script.as_bytes(), false)
            .unwrap();
        (session, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_quoted_arguments() {
        assert_eq!(
            parse_command("add \"the rota (weekends)\"").unwrap(),
            Some(Command::Add("the rota (weekends)".to_string()))
        );
        assert_eq!(
            parse_command("edit 2 Notes 'follow up'").unwrap(),
            Some(Command::Edit {
                row: Some(1),
                column: "Notes".to_string(),
                value: "follow up".to_string()
            })
        );
        assert_eq!(parse_command("delete 0").unwrap(), Some(Command::Delete(None)));
        assert_eq!(parse_command("  # note").unwrap(), None);
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("add \"open").is_err());
    }

    #[test]
    fn parses_theme_partition() {
        assert_eq!(
            parse_command("themes set \"a, b\" c \"\"").unwrap(),
            Some(Command::ThemesSet(vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec![],
            ]))
        );
    }

    #[test]
    fn unquoted_add_joins_words() {
        assert_eq!(
            parse_command("add Pay was fine.").unwrap(),
            Some(Command::Add("Pay was fine.".to_string()))
        );
    }

    #[test]
    fn coding_session_end_to_end() {
        let (session, out) = run("\
add \"rota (weekends)\"
edit 1 Code Scheduling
select Scheduling
next
add \"Training was rushed\"
add \"not in this document\"
rename Scheduling Workload
counter
");
        assert!(out.contains("added row 1"));
        assert!(out.contains("added row 2"));
        assert!(!out.contains("added row 3"));
        assert!(out.contains("renamed 2 rows"));
        assert!(out.contains("Workload"));
        assert_eq!(session.counter().count("Workload"), 2);
        assert_eq!(session.codebook().rows()[1].document_id, 2);
    }

    #[test]
    fn edit_by_column_position() {
        assert_eq!(column_position("@6"), Some(5));
        assert_eq!(column_position("@0"), None);
        assert_eq!(column_position("Theme"), None);

        let (session, _) = run("\
add Staff
add-column Theme keep
edit 1 Theme core
edit 1 @6 extra
");
        let row = session.codebook().get(0).unwrap();
        assert_eq!(row.theme, "core");
        assert_eq!(row.extra, vec!["extra"]);
    }

    #[test]
    fn preconditions_fail_silently() {
        let (session, out) = run("delete 7\nedit 9 Code X\nselect nope\nprev\njump 0\n");
        assert_eq!(out, "");
        assert!(session.codebook().is_empty());
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn unknown_command_prints_hint_and_continues() {
        let (session, out) = run("bogus\nnext\n");
        assert!(out.contains("unknown command"));
        assert_eq!(session.current_index(), Some(2));
    }

    #[test]
    fn show_renders_marks() {
        let (_, out) = run("add \"rota (weekends)\"\nshow\n");
        assert!(out.contains("<mark class=\"extract\">rota (weekends)</mark>"));
    }

    #[test]
    fn themes_export_to_output() {
        let (_, out) = run("\
add Staff
edit 1 Code A
add rota
edit 2 Code B
themes
themes add
themes set A B \"\"
themes rename 3 Later
themes export
");
        assert!(out.contains("added theme 3"));
        assert!(out.contains("Theme 1,Theme 2,Later\nA,B,\n"));
    }

    #[test]
    fn quit_stops_reading() {
        let (session, _) = run("next\nquit\nprev\n");
        assert_eq!(session.current_index(), Some(2));
    }

    #[test]
    fn auto_render_after_navigation() {
        let config = Config::minimal();
        let mut session = Session::default();
        session.load_corpus(vec!["one".to_string(), "two".to_string()]);
        let mut out = Vec::new();
        Shell::new(&mut session, &config, &mut out, true)
            .run("next\ncounter\n".as_bytes(), false)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Document 2/2").count(), 1);
    }
}
