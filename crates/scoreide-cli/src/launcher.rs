use anyhow::{Context, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;

use scoreide::{Configuration, Launcher, Result};

/// Opens files with the platform opener, edits them with the configured
/// editor, and runs shell escapes through `sh -c`.
pub struct SystemLauncher {
    editor: String,
    opener: String,
}

impl SystemLauncher {
    pub fn new(config: &Configuration) -> Self {
        SystemLauncher {
            editor: config.editor.clone(),
            opener: config.opener.clone(),
        }
    }
}

/// Split a configured command like `code --wait` into program and arguments.
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut words = command.split_whitespace();
    let program = words.next()?;
    Some((program, words.collect()))
}

fn wait(mut command: Command) -> Result<()> {
    log::debug!("running {:?}", command);
    let status = command
        .status()
        .with_context(|| format!("Failed to run {:?}", command.get_program()))?;
    if !status.success() {
        return Err(anyhow!("{:?} exited with {}", command.get_program(), status).into());
    }
    Ok(())
}

impl Launcher for SystemLauncher {
    fn open(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut command = Command::new(&self.opener);
        command.args(paths);
        wait(command)
    }

    fn edit(&self, path: &Path) -> Result<()> {
        let (program, args) =
            split_command(&self.editor).ok_or_else(|| anyhow!("No editor configured"))?;
        let mut command = Command::new(program);
        command.args(args).arg(path);
        wait(command)
    }

    fn shell(&self, command: &str, directory: &Path) -> Result<Vec<String>> {
        log::debug!("shell {:?} in {}", command, directory.display());
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(directory)
            .output()
            .context("Failed to run sh")?;
        let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        lines.extend(
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string),
        );
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(editor: &str) -> SystemLauncher {
        SystemLauncher {
            editor: editor.to_string(),
            opener: "true".to_string(),
        }
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("code --wait"), Some(("code", vec!["--wait"])));
        assert_eq!(split_command("vi"), Some(("vi", vec![])));
        assert_eq!(split_command("   "), None);
    }

    #[test]
    fn test_shell_collects_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("music.ly"), "").unwrap();
        let lines = launcher("vi").shell("ls; echo oops >&2", dir.path()).unwrap();
        assert_eq!(lines, vec!["music.ly", "oops"]);
    }

    #[test]
    fn test_edit_with_failing_editor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definition.py");
        assert!(launcher("false").edit(&path).is_err());
        assert!(launcher("true --wait").edit(&path).is_ok());
        assert!(launcher("").edit(&path).is_err());
    }

    #[test]
    fn test_open_nothing() {
        assert!(launcher("vi").open(&[]).is_ok());
    }
}
