//! Console terminals: a line editor for interactive use and plain buffered
//! stdin for pipes.

use anyhow::{Context, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use scoreide::{Result, Terminal};

fn write_lines(lines: &[String]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub struct LineEditor {
    editor: DefaultEditor,
    history: PathBuf,
}

impl LineEditor {
    pub fn new(history: PathBuf) -> anyhow::Result<Self> {
        let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;
        if history.exists() {
            editor.load_history(&history).ok();
        }
        Ok(LineEditor { editor, history })
    }
}

impl Terminal for LineEditor {
    fn display(&mut self, lines: &[String]) -> Result<()> {
        write_lines(lines)
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        match self.editor.readline(&format!("{}> ", message)) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).ok();
                }
                Ok(Some(line))
            }
            // Ctrl-C quits like `q`.
            Err(ReadlineError::Interrupted) => Ok(Some("q".to_string())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(anyhow!("line editor: {}", e).into()),
        }
    }

    /// Save history and clear the screen once the session is over.
    fn clear(&mut self) -> Result<()> {
        if let Some(parent) = self.history.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Err(e) = self.editor.save_history(&self.history) {
            log::warn!("failed to save history to {}: {}", self.history.display(), e);
        }
        let mut out = std::io::stdout().lock();
        write!(out, "\x1b[2J\x1b[H")?;
        out.flush()?;
        Ok(())
    }
}

/// Reads lines from stdin without echo or history.
pub struct PlainTerminal {
    input: std::io::StdinLock<'static>,
}

impl PlainTerminal {
    pub fn new() -> Self {
        PlainTerminal {
            input: std::io::stdin().lock(),
        }
    }
}

impl Terminal for PlainTerminal {
    fn display(&mut self, lines: &[String]) -> Result<()> {
        write_lines(lines)
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        {
            let mut out = std::io::stdout().lock();
            write!(out, "{}> ", message)?;
            out.flush()?;
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
