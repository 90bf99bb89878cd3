//! Repository commands. Each works on the wrapper of the current score;
//! the starred variants repeat over every score from the root.

use std::path::{Path, PathBuf};

use crate::classify;
use crate::collaborators::CLEAN_STATUS;
use crate::controller::Ide;
use crate::error::Result;
use crate::getter::Getter;
use crate::io::Interaction;
use crate::listing;

fn wrapper(ide: &Ide) -> Option<PathBuf> {
    classify::wrapper_directory(ide.current_directory(), ide.roots())
}

fn wrappers(ide: &Ide) -> Result<Vec<PathBuf>> {
    let home = ide.roots().home(ide.session().is_test());
    Ok(listing::visible_directories(home, ide.roots())?
        .into_iter()
        .filter_map(|inner| inner.parent().map(Path::to_path_buf))
        .collect())
}

fn header(ide: &mut Ide, wrapper: &Path) -> Result<()> {
    let shown = ide.trim(wrapper);
    ide.display(&[format!("{} ...", shown)])
}

fn show(ide: &mut Ide, result: Result<Vec<String>>) -> Result<()> {
    match result {
        Ok(lines) => ide.display(&lines),
        Err(e) => ide.show_error(&e),
    }
}

// ── Single score ─────────────────────────────────────────────────────

fn status_at(ide: &mut Ide, wrapper: &Path) -> Result<()> {
    match ide.repository.status(wrapper) {
        Ok(lines) if lines.iter().any(|l| l == CLEAN_STATUS) => {
            let shown = ide.trim(wrapper);
            ide.display(&[format!("{} ... OK", shown)])
        }
        other => show(ide, other),
    }
}

fn add_at(ide: &mut Ide, wrapper: &Path) -> Result<()> {
    let untracked = match ide.repository.untracked(wrapper) {
        Ok(untracked) => untracked,
        Err(e) => return ide.show_error(&e),
    };
    if untracked.is_empty() {
        return ide.display(&["Nothing to add.".to_string()]);
    }
    let mut lines = vec!["Adding ...".to_string()];
    lines.extend(untracked.iter().map(|p| format!("  {}", ide.trim(p))));
    ide.display(&lines)?;
    let result = ide.repository.add(wrapper);
    show(ide, result)
}

fn commit_message(ide: &mut Ide) -> Result<Option<String>> {
    let Some(answer) = Getter::new().text("Commit message").run_one(ide)? else {
        return Ok(None);
    };
    let Some(message) = answer.text().map(str::to_string) else {
        return Ok(None);
    };
    ide.display(&[format!("commit message will be: {:?}", message)])?;
    if !ide.confirm("Ok?")? {
        return Ok(None);
    }
    Ok(Some(message))
}

fn commit_at(ide: &mut Ide, wrapper: &Path, message: &str) -> Result<()> {
    if ide.suppressed("commit") {
        return Ok(());
    }
    log::info!("committing {}", wrapper.display());
    let result = ide.repository.commit(wrapper, message);
    show(ide, result)
}

fn update_at(ide: &mut Ide, wrapper: &Path) -> Result<()> {
    if ide.suppressed("update") {
        return Ok(());
    }
    let result = ide.repository.update(wrapper);
    show(ide, result)?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

pub(crate) fn status(ide: &mut Ide) -> Result<()> {
    match wrapper(ide) {
        Some(wrapper) => status_at(ide, &wrapper),
        None => Ok(()),
    }
}

pub(crate) fn add(ide: &mut Ide) -> Result<()> {
    match wrapper(ide) {
        Some(wrapper) => add_at(ide, &wrapper),
        None => Ok(()),
    }
}

pub(crate) fn commit(ide: &mut Ide) -> Result<()> {
    let Some(wrapper) = wrapper(ide) else {
        return Ok(());
    };
    match commit_message(ide)? {
        Some(message) => commit_at(ide, &wrapper, &message),
        None => Ok(()),
    }
}

pub(crate) fn diff(ide: &mut Ide) -> Result<()> {
    let Some(wrapper) = wrapper(ide) else {
        return Ok(());
    };
    match ide.repository.diff(&wrapper) {
        Ok(lines) if lines.is_empty() => ide.display(&["No changes.".to_string()]),
        other => show(ide, other),
    }
}

pub(crate) fn revert(ide: &mut Ide) -> Result<()> {
    let Some(wrapper) = wrapper(ide) else {
        return Ok(());
    };
    let modified = match ide.repository.modified(&wrapper) {
        Ok(modified) => modified,
        Err(e) => return ide.show_error(&e),
    };
    if modified.is_empty() {
        return ide.display(&["No modified files.".to_string()]);
    }
    let mut lines = vec!["Reverting ...".to_string()];
    lines.extend(modified.iter().map(|p| format!("  {}", ide.trim(p))));
    ide.display(&lines)?;
    if !ide.confirm("Ok?")? || ide.suppressed("revert") {
        return Ok(());
    }
    let result = ide.repository.revert(&wrapper);
    show(ide, result)?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

pub(crate) fn update(ide: &mut Ide) -> Result<()> {
    match wrapper(ide) {
        Some(wrapper) => update_at(ide, &wrapper),
        None => Ok(()),
    }
}

// ── Every score ──────────────────────────────────────────────────────

pub(crate) fn status_every(ide: &mut Ide) -> Result<()> {
    for wrapper in wrappers(ide)? {
        status_at(ide, &wrapper)?;
    }
    Ok(())
}

pub(crate) fn add_every(ide: &mut Ide) -> Result<()> {
    for wrapper in wrappers(ide)? {
        header(ide, &wrapper)?;
        add_at(ide, &wrapper)?;
    }
    Ok(())
}

pub(crate) fn commit_every(ide: &mut Ide) -> Result<()> {
    let Some(message) = commit_message(ide)? else {
        return Ok(());
    };
    for wrapper in wrappers(ide)? {
        header(ide, &wrapper)?;
        commit_at(ide, &wrapper, &message)?;
    }
    Ok(())
}

pub(crate) fn update_every(ide: &mut Ide) -> Result<()> {
    for wrapper in wrappers(ide)? {
        header(ide, &wrapper)?;
        update_at(ide, &wrapper)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{Collaborators, Repository};
    use crate::error::{IdeError, Result};
    use crate::test_support::Fixture;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// A dirty repository that records every call.
    #[derive(Clone, Default)]
    struct Recording {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Recording {
        fn note(&self, call: &str, path: &Path) {
            let name = path.file_name().unwrap().to_string_lossy();
            self.calls.borrow_mut().push(format!("{} {}", call, name));
        }

        fn saw(&self, call: &str) -> bool {
            self.calls.borrow().iter().any(|c| c == call)
        }
    }

    impl Repository for Recording {
        fn status(&self, path: &Path) -> Result<Vec<String>> {
            self.note("status", path);
            Ok(vec!["modified: materials/tempi/definition.py".to_string()])
        }

        fn add(&self, path: &Path) -> Result<Vec<String>> {
            self.note("add", path);
            Ok(Vec::new())
        }

        fn commit(&self, path: &Path, message: &str) -> Result<Vec<String>> {
            self.note("commit", path);
            Ok(vec![format!("[main 1234567] {}", message)])
        }

        fn revert(&self, path: &Path) -> Result<Vec<String>> {
            self.note("revert", path);
            Ok(Vec::new())
        }

        fn diff(&self, path: &Path) -> Result<Vec<String>> {
            self.note("diff", path);
            Ok(vec!["-old".to_string(), "+new".to_string()])
        }

        fn update(&self, path: &Path) -> Result<Vec<String>> {
            self.note("update", path);
            Err(IdeError::Repository("no remote configured".to_string()))
        }

        fn untracked(&self, path: &Path) -> Result<Vec<PathBuf>> {
            Ok(vec![path.join("README.md")])
        }

        fn modified(&self, path: &Path) -> Result<Vec<PathBuf>> {
            Ok(vec![path.join("red_score/materials/tempi/definition.py")])
        }

        fn is_tracked(&self, _path: &Path) -> Result<bool> {
            Ok(true)
        }

        fn remove(&self, path: &Path) -> Result<Vec<String>> {
            self.note("remove", path);
            Ok(vec![format!("rm '{}'", path.display())])
        }
    }

    #[test]
    fn test_clean_status_is_ok() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red mm st q")).unwrap();
        assert!(ide.transcript().contains("red_score ... OK"));

        ide.run(Some("st* q")).unwrap();
        for score in ["blue_score", "green_score", "red_score"] {
            assert!(ide.transcript().contains(&format!("{} ... OK", score)));
        }
    }

    #[test]
    fn test_dirty_status_is_listed() {
        let fx = Fixture::new();
        let mut ide = fx.ide_with(
            Collaborators::inert().with_repository(Recording::default()),
            false,
        );
        ide.run(Some("red st q")).unwrap();
        assert!(!ide.transcript().contains("red_score ... OK"));
        assert!(ide.transcript().contains("modified: materials/tempi/definition.py"));
    }

    #[test]
    fn test_commit_every_in_test_mode() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("ci* Tidy. q")).unwrap();
        assert!(ide.transcript().contains("green_score ..."));
        assert_eq!(ide.session().attempted().len(), 3);
    }

    #[test]
    fn test_repository_calls() {
        let fx = Fixture::new();
        let repository = Recording::default();
        let mut ide = fx.ide_with(
            Collaborators::inert().with_repository(repository.clone()),
            false,
        );
        ide.run(Some("red st diff add ci Fix. y rev y up q")).unwrap();
        let transcript = ide.transcript();
        assert!(transcript.contains("modified: materials/tempi/definition.py"));
        assert!(transcript.contains("+new"));
        assert!(transcript.contains("  red_score/README.md"));
        assert!(transcript.contains("[main 1234567] Fix."));
        assert!(transcript.contains("  red_score/red_score/materials/tempi/definition.py"));
        assert!(transcript.contains("repository error: no remote configured"));
        for call in ["status red_score", "diff red_score", "add red_score", "commit red_score", "revert red_score", "update red_score"] {
            assert!(repository.saw(call), "missing {}", call);
        }
    }

    #[test]
    fn test_declined_commit() {
        let fx = Fixture::new();
        let repository = Recording::default();
        let mut ide = fx.ide_with(
            Collaborators::inert().with_repository(repository.clone()),
            false,
        );
        ide.run(Some("red ci Fix. n q")).unwrap();
        assert!(!repository.saw("commit red_score"));
        assert!(ide.transcript().contains("Ok? (y/n)> n"));
    }

    #[test]
    fn test_tracked_removal_goes_through_repository() {
        let fx = Fixture::new();
        let repository = Recording::default();
        let mut ide = fx.ide_with(
            Collaborators::inert().with_repository(repository.clone()),
            false,
        );
        ide.run(Some("red mm rm tempi remove q")).unwrap();
        assert!(repository.saw("remove tempi"));
    }
}
