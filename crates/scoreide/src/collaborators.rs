//! Seams to the outside world.
//!
//! The controller only ever holds these as trait objects. The `Null*`
//! implementations do nothing observable and back scripted runs and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

// ── Terminal ─────────────────────────────────────────────────────────

/// Line-oriented console I/O.
pub trait Terminal {
    fn display(&mut self, lines: &[String]) -> Result<()>;

    /// Read one line. `None` means input is exhausted.
    fn prompt(&mut self, message: &str) -> Result<Option<String>>;

    fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{} (y/n)", message))?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y") | Some("yes") | Some("Y")
        ))
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A terminal with no input and nowhere to write.
#[derive(Debug, Default)]
pub struct NullTerminal;

impl Terminal for NullTerminal {
    fn display(&mut self, _lines: &[String]) -> Result<()> {
        Ok(())
    }

    fn prompt(&mut self, _message: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

// ── Repository ───────────────────────────────────────────────────────

/// Version control, keyed by path. Every operation answers with
/// human-readable lines.
pub trait Repository {
    fn status(&self, path: &Path) -> Result<Vec<String>>;
    fn add(&self, path: &Path) -> Result<Vec<String>>;
    fn commit(&self, path: &Path, message: &str) -> Result<Vec<String>>;
    fn revert(&self, path: &Path) -> Result<Vec<String>>;
    fn diff(&self, path: &Path) -> Result<Vec<String>>;
    fn update(&self, path: &Path) -> Result<Vec<String>>;

    /// Paths under `path` the repository does not know about yet.
    fn untracked(&self, path: &Path) -> Result<Vec<PathBuf>>;
    /// Tracked paths under `path` with uncommitted changes.
    fn modified(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn is_tracked(&self, path: &Path) -> Result<bool>;
    /// Remove from the index and from disk.
    fn remove(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reports every tree as clean and tracks nothing.
#[derive(Debug, Default)]
pub struct NullRepository;

pub const CLEAN_STATUS: &str = "nothing to commit, working tree clean";

impl Repository for NullRepository {
    fn status(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(vec![CLEAN_STATUS.to_string()])
    }

    fn add(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn commit(&self, _path: &Path, _message: &str) -> Result<Vec<String>> {
        Ok(vec![CLEAN_STATUS.to_string()])
    }

    fn revert(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn diff(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn update(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(vec!["Already up to date.".to_string()])
    }

    fn untracked(&self, _path: &Path) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn modified(&self, _path: &Path) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn is_tracked(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn remove(&self, path: &Path) -> Result<Vec<String>> {
        remove_path(path)?;
        Ok(Vec::new())
    }
}

/// Remove a file or directory tree.
pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

// ── Renderer ─────────────────────────────────────────────────────────

/// What an external typesetting run printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl RenderOutput {
    pub fn failed(&self) -> bool {
        !self.stderr.is_empty()
    }
}

pub trait Renderer {
    /// Run the tool that understands `source`. With `output`, the rendered
    /// artifact is written there; without, the source is only checked.
    fn render(&self, source: &Path, output: Option<&Path>) -> Result<RenderOutput>;
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _source: &Path, _output: Option<&Path>) -> Result<RenderOutput> {
        Ok(RenderOutput::default())
    }
}

// ── Templates ────────────────────────────────────────────────────────

pub trait TemplateExpander {
    fn expand(&self, name: &str, substitutions: &BTreeMap<String, String>) -> Result<Vec<u8>>;
}

// ── Launcher ─────────────────────────────────────────────────────────

/// Opening files, editing them, and shell escapes.
pub trait Launcher {
    fn open(&self, paths: &[PathBuf]) -> Result<()>;
    fn edit(&self, path: &Path) -> Result<()>;
    fn shell(&self, command: &str, directory: &Path) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct NullLauncher;

impl Launcher for NullLauncher {
    fn open(&self, _paths: &[PathBuf]) -> Result<()> {
        Ok(())
    }

    fn edit(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn shell(&self, _command: &str, _directory: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// The full set of collaborators an [`Ide`](crate::Ide) runs against.
pub struct Collaborators {
    pub terminal: Box<dyn Terminal>,
    pub repository: Box<dyn Repository>,
    pub renderer: Box<dyn Renderer>,
    pub templates: Box<dyn TemplateExpander>,
    pub launcher: Box<dyn Launcher>,
}

impl Collaborators {
    /// Everything inert; templates come from the built-in boilerplate.
    pub fn inert() -> Self {
        Collaborators {
            terminal: Box::new(NullTerminal),
            repository: Box::new(NullRepository),
            renderer: Box::new(NullRenderer),
            templates: Box::new(crate::boilerplate::Boilerplate::builtin()),
            launcher: Box::new(NullLauncher),
        }
    }

    pub fn with_terminal(mut self, terminal: impl Terminal + 'static) -> Self {
        self.terminal = Box::new(terminal);
        self
    }

    pub fn with_repository(mut self, repository: impl Repository + 'static) -> Self {
        self.repository = Box::new(repository);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_templates(mut self, templates: impl TemplateExpander + 'static) -> Self {
        self.templates = Box::new(templates);
        self
    }

    pub fn with_launcher(mut self, launcher: impl Launcher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<String>);

    impl Terminal for Scripted {
        fn display(&mut self, _lines: &[String]) -> Result<()> {
            Ok(())
        }

        fn prompt(&mut self, _message: &str) -> Result<Option<String>> {
            Ok(if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            })
        }
    }

    #[test]
    fn test_default_confirm() {
        let mut t = Scripted(vec!["y".into(), "no".into(), " yes ".into()]);
        assert!(t.confirm("Ok?").unwrap());
        assert!(!t.confirm("Ok?").unwrap());
        assert!(t.confirm("Ok?").unwrap());
        assert!(!t.confirm("Ok?").unwrap());
    }

    #[test]
    fn test_null_repository_is_clean() {
        let lines = NullRepository.status(Path::new("/x")).unwrap();
        assert!(lines[0].contains("nothing to commit"));
    }

    #[test]
    fn test_render_output_failure() {
        let mut output = RenderOutput::default();
        assert!(!output.failed());
        output.stderr.push("error: bad".into());
        assert!(output.failed());
    }

    #[test]
    fn test_remove_path_handles_trees_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("a/b");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("f.txt"), "x").unwrap();
        remove_path(&dir.path().join("a")).unwrap();
        assert!(!dir.path().join("a").exists());
        remove_path(&dir.path().join("missing")).unwrap();
    }
}
