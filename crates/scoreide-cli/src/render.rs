//! The renderer collaborator: LilyPond, LaTeX and the Python interpreter
//! run as child processes.

use anyhow::{Context, anyhow};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use scoreide::{Configuration, RenderOutput, Renderer, Result};

/// Auxiliary files LaTeX leaves next to its output.
const LATEX_LEFTOVERS: &[&str] = &["aux", "log", "out"];

pub struct ProcessRenderer {
    lilypond: String,
    latex: String,
    python: String,
    lilypond_log: Option<PathBuf>,
}

impl ProcessRenderer {
    pub fn new(config: &Configuration) -> Self {
        ProcessRenderer {
            lilypond: config.lilypond.clone(),
            latex: config.latex.clone(),
            python: config.python.clone(),
            lilypond_log: config.lilypond_log.clone(),
        }
    }

    fn command(&self, source: &Path, output: Option<&Path>) -> Result<Command> {
        let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("");
        let command = match (extension, output) {
            ("ly", Some(output)) => {
                let mut command = Command::new(&self.lilypond);
                // LilyPond appends `.pdf` to the basename it is given.
                command.arg("-o").arg(output.with_extension("")).arg(source);
                command
            }
            ("ly", None) => {
                let mut command = Command::new(&self.lilypond);
                command.arg("-dno-print-pages").arg(source);
                command
            }
            ("tex", output) => {
                let mut command = Command::new(&self.latex);
                command.args(["-interaction=nonstopmode", "-halt-on-error"]);
                if let Some(output) = output {
                    let directory = output.parent().unwrap_or(Path::new("."));
                    let job = output.file_stem().unwrap_or_default();
                    command
                        .arg("-output-directory")
                        .arg(directory)
                        .arg("-jobname")
                        .arg(job);
                }
                command.arg(source);
                command
            }
            ("py", output) => {
                // A definition writes its illustration to the path it is given.
                let mut command = Command::new(&self.python);
                command.arg(source);
                if let Some(output) = output {
                    command.arg(output);
                }
                command
            }
            _ => return Err(anyhow!("Don't know how to render {}", source.display()).into()),
        };
        Ok(command)
    }
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Keep everything LilyPond printed, for the `log` command.
fn write_log(path: &Path, output: &Output) -> Result<()> {
    if let Some(directory) = path.parent() {
        std::fs::create_dir_all(directory)?;
    }
    let mut text = output.stdout.clone();
    text.extend_from_slice(&output.stderr);
    std::fs::write(path, text)?;
    Ok(())
}

fn latex_leftovers(output: &Path) -> Vec<PathBuf> {
    LATEX_LEFTOVERS
        .iter()
        .map(|extension| output.with_extension(extension))
        .collect()
}

impl Renderer for ProcessRenderer {
    fn render(&self, source: &Path, output: Option<&Path>) -> Result<RenderOutput> {
        let mut command = self.command(source, output)?;
        if let Some(directory) = source.parent() {
            command.current_dir(directory);
        }
        log::debug!("running {:?}", command);
        let result = command
            .output()
            .with_context(|| format!("Failed to run {:?}", command.get_program()))?;

        if source.extension().is_some_and(|e| e == "ly")
            && let Some(log_path) = &self.lilypond_log
        {
            write_log(log_path, &result)?;
        }
        if source.extension().is_some_and(|e| e == "tex")
            && let Some(output) = output
        {
            for leftover in latex_leftovers(output) {
                if leftover.is_file() {
                    std::fs::remove_file(leftover)?;
                }
            }
        }

        // Progress chatter on stderr only counts when the process failed.
        let mut stderr = Vec::new();
        if !result.status.success() {
            stderr = lines(&result.stderr);
            if stderr.is_empty() {
                stderr = lines(&result.stdout);
            }
            if stderr.is_empty() {
                stderr.push(format!("{} exited with {}", source.display(), result.status));
            }
        }
        Ok(RenderOutput {
            stdout: lines(&result.stdout),
            stderr,
        })
    }
}
