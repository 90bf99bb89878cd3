//! Back, home, jumps, sibling hops, depots, search and the shell escape.

use std::path::{Path, PathBuf};

use crate::classify::{self, DirectoryKind, Roots};
use crate::controller::Ide;
use crate::error::Result;
use crate::getter::{self, Getter};
use crate::io::Interaction;
use crate::listing;
use crate::names;
use crate::session::{Backtrack, Navigation};

pub(crate) fn back(ide: &mut Ide) -> Result<()> {
    ide.session_mut().request_backtrack(Backtrack::Local);
    Ok(())
}

pub(crate) fn home(ide: &mut Ide) -> Result<()> {
    ide.session_mut().request_backtrack(Backtrack::Scores);
    Ok(())
}

pub(crate) fn score(ide: &mut Ide) -> Result<()> {
    ide.session_mut().request_backtrack(Backtrack::Score);
    Ok(())
}

pub(crate) fn quit(ide: &mut Ide) -> Result<()> {
    ide.session_mut().request_quit();
    Ok(())
}

pub(crate) fn up(ide: &mut Ide) -> Result<()> {
    let parent = ide
        .current_directory()
        .parent()
        .filter(|p| ide.roots().root_of(p).is_some())
        .map(Path::to_path_buf);
    match parent {
        Some(parent) => {
            ide.session_mut()
                .request_navigation(Navigation::Enter(parent));
            Ok(())
        }
        None => ide.display(&["Already at the top.".to_string()]),
    }
}

pub(crate) fn show_commands(ide: &mut Ide) -> Result<()> {
    ide.session_mut().toggle_show_all_commands();
    Ok(())
}

pub(crate) fn show_navigation(ide: &mut Ide) -> Result<()> {
    let lines = ide.navigation_lines();
    ide.display(&lines)
}

pub(crate) fn shell(ide: &mut Ide) -> Result<()> {
    let Some(answer) = Getter::new().text("Shell command").run_one(ide)? else {
        return Ok(());
    };
    match answer.text() {
        Some(command) => run_shell(ide, command),
        None => Ok(()),
    }
}

/// Run `command` in the current directory and show what it printed.
pub(crate) fn run_shell(ide: &mut Ide, command: &str) -> Result<()> {
    let command = names::untilde(command);
    if ide.suppressed("shell") {
        return Ok(());
    }
    let directory = ide.current_directory().to_path_buf();
    log::debug!("shell {:?} in {}", command, directory.display());
    match ide.launcher.shell(&command, &directory) {
        Ok(lines) => ide.display(&lines)?,
        Err(e) => ide.show_error(&e)?,
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

// ── In-score jumps ───────────────────────────────────────────────────

fn go_to(ide: &mut Ide, kind: DirectoryKind) -> Result<()> {
    let Some(target) = classify::contents_directory(ide.current_directory(), ide.roots(), kind)
    else {
        return Ok(());
    };
    if target.is_dir() {
        ide.session_mut()
            .request_navigation(Navigation::Enter(target));
        Ok(())
    } else {
        let shown = ide.trim(&target);
        ide.display(&[format!("Directory not found: {}", shown)])
    }
}

pub(crate) fn materials(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Materials)
}

pub(crate) fn segments(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Segments)
}

pub(crate) fn builds(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Builds)
}

pub(crate) fn distribution(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Distribution)
}

pub(crate) fn stylesheets(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Stylesheets)
}

pub(crate) fn tools(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Tools)
}

pub(crate) fn test(ide: &mut Ide) -> Result<()> {
    go_to(ide, DirectoryKind::Test)
}

pub(crate) fn wrapper(ide: &mut Ide) -> Result<()> {
    if let Some(wrapper) = classify::wrapper_directory(ide.current_directory(), ide.roots()) {
        ide.session_mut()
            .request_navigation(Navigation::Enter(wrapper));
    }
    Ok(())
}

// ── Siblings ─────────────────────────────────────────────────────────

fn step(index: usize, len: usize, forward: bool) -> usize {
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}

/// Hop among the packages of the enclosing container. From the container
/// itself, forward enters the first package and backward the last.
fn package_sibling(ide: &mut Ide, forward: bool) -> Result<()> {
    let current = ide.current_directory().to_path_buf();
    let is_package = ide.kind().is_package();
    let container = if is_package {
        match current.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Ok(()),
        }
    } else {
        current.clone()
    };
    let siblings = listing::visible_directories(&container, ide.roots())?;
    if siblings.is_empty() {
        return ide.display(&["No packages.".to_string()]);
    }
    let index = match siblings.iter().position(|p| *p == current) {
        Some(i) => step(i, siblings.len(), forward),
        None if forward => 0,
        None => siblings.len() - 1,
    };
    let target = siblings[index].clone();
    let navigation = if is_package {
        Navigation::Replace(target)
    } else {
        Navigation::Enter(target)
    };
    ide.session_mut().request_navigation(navigation);
    Ok(())
}

pub(crate) fn previous_package(ide: &mut Ide) -> Result<()> {
    package_sibling(ide, false)
}

pub(crate) fn next_package(ide: &mut Ide) -> Result<()> {
    package_sibling(ide, true)
}

fn home_directory(ide: &Ide) -> PathBuf {
    ide.roots().home(ide.session().is_test()).to_path_buf()
}

fn score_sibling(ide: &mut Ide, forward: bool) -> Result<()> {
    let scores = listing::visible_directories(&home_directory(ide), ide.roots())?;
    if scores.is_empty() {
        return ide.display(&["No scores.".to_string()]);
    }
    let current = ide.score();
    let index = match current
        .as_ref()
        .and_then(|score| scores.iter().position(|p| p == score))
    {
        Some(i) => step(i, scores.len(), forward),
        None if forward => 0,
        None => scores.len() - 1,
    };
    let target = scores[index].clone();
    let at_score = current.as_deref() == Some(ide.current_directory());
    let navigation = if at_score {
        Navigation::Replace(target)
    } else {
        Navigation::Enter(target)
    };
    ide.session_mut().request_navigation(navigation);
    Ok(())
}

pub(crate) fn previous_score(ide: &mut Ide) -> Result<()> {
    score_sibling(ide, false)
}

pub(crate) fn next_score(ide: &mut Ide) -> Result<()> {
    score_sibling(ide, true)
}

// ── Depots ───────────────────────────────────────────────────────────

/// Offer every score's directory of `kind` in one selector.
fn depot(ide: &mut Ide, kind: DirectoryKind) -> Result<()> {
    let Some(name) = kind.contents_name() else {
        return Ok(());
    };
    let mut labels = Vec::new();
    let mut directories = Vec::new();
    for score in listing::visible_directories(&home_directory(ide), ide.roots())? {
        let directory = score.join(name);
        if directory.is_dir() {
            labels.push(format!("{} : {}", listing::score_title(&score)?, name));
            directories.push(directory);
        }
    }
    if directories.is_empty() {
        return ide.display(&[format!("No {} directories.", name)]);
    }
    if let Some(index) = getter::select(ide, "Select directory", &labels)? {
        let target = directories.swap_remove(index);
        ide.session_mut()
            .request_navigation(Navigation::Enter(target));
    }
    Ok(())
}

pub(crate) fn materials_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Materials)
}

pub(crate) fn segments_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Segments)
}

pub(crate) fn builds_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Builds)
}

pub(crate) fn distribution_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Distribution)
}

pub(crate) fn stylesheets_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Stylesheets)
}

pub(crate) fn tools_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Tools)
}

pub(crate) fn test_depot(ide: &mut Ide) -> Result<()> {
    depot(ide, DirectoryKind::Test)
}

// ── Search ───────────────────────────────────────────────────────────

const PACKAGE_DIRECTORIES: &[&str] = &["materials", "segments", "builds"];
const FILE_DIRECTORIES: &[&str] = &["distribution", "stylesheets", "tools", "test"];

/// `%name`: jump to the first package, then the first content file, whose
/// name starts with `name`. Searches the current score, or every score from
/// outside one.
pub(crate) fn search(ide: &mut Ide, name: &str) -> Result<()> {
    let wanted = names::untilde(name).to_lowercase();
    let scores = match ide.score() {
        Some(score) => vec![score],
        None => listing::visible_directories(&home_directory(ide), ide.roots())?,
    };
    for score in &scores {
        if let Some(found) = find_in_score(score, &wanted, ide.roots())? {
            log::debug!("search {:?} found {}", name, found.display());
            return if found.is_dir() {
                ide.session_mut()
                    .request_navigation(Navigation::Enter(found));
                Ok(())
            } else {
                ide.open_file(&found)
            };
        }
    }
    ide.display(&[format!("No match for {:?}.", names::untilde(name))])
}

fn find_in_score(score: &Path, wanted: &str, roots: &Roots) -> Result<Option<PathBuf>> {
    let hit = |listed: &listing::Listed| {
        listed.name.to_lowercase().starts_with(wanted)
            || listed.display.to_lowercase().starts_with(wanted)
    };
    for contents in PACKAGE_DIRECTORIES {
        if let Some(found) = listing::visible(&score.join(contents), roots)?
            .into_iter()
            .find(|l| l.is_directory && hit(l))
        {
            return Ok(Some(found.path));
        }
    }
    for contents in FILE_DIRECTORIES {
        if let Some(found) = listing::visible(&score.join(contents), roots)?
            .into_iter()
            .find(|l| !l.is_directory && hit(l))
        {
            return Ok(Some(found.path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::test_support::Fixture;

    #[test]
    fn test_depot_lists_every_score() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("hhg 2 q")).unwrap();
        let transcript = ide.transcript();
        assert!(transcript.contains("   1: Blue Score : segments"));
        assert!(transcript.contains("   2: Green Score (2018) : segments"));
        assert!(transcript.contains("   3: Red Score : segments"));
        assert_eq!(
            transcript.titles().last().unwrap(),
            "Green Score (2018) : segments"
        );
    }

    #[test]
    fn test_score_hops_are_cyclic() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red >> q")).unwrap();
        assert_eq!(ide.transcript().titles().last().unwrap(), "Blue Score");
        assert_eq!(ide.stack().len(), 2);

        ide.run(Some("<< q")).unwrap();
        assert_eq!(ide.transcript().titles().last().unwrap(), "Red Score");
    }

    #[test]
    fn test_score_hop_from_inside_enters() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red mm << q")).unwrap();
        assert_eq!(ide.current_directory(), fx.green());
    }

    #[test]
    fn test_search_finds_packages_and_files() {
        let fx = Fixture::new();
        std::fs::write(fx.red().join("tools/helpers.py"), "").unwrap();
        let mut ide = fx.ide();

        ide.run(Some("%tem q")).unwrap();
        assert_eq!(ide.current_directory(), fx.red().join("materials/tempi"));

        ide.run(Some("red %help q")).unwrap();
        assert!(ide.session().has_attempted("open"));

        ide.run(Some("red %zzz q")).unwrap();
        assert!(ide.transcript().contains("No match for \"zzz\"."));
    }

    #[test]
    fn test_missing_contents_directory() {
        let fx = Fixture::new();
        std::fs::remove_dir(fx.red().join("test")).unwrap();
        let mut ide = fx.ide();
        ide.run(Some("red tt q")).unwrap();
        assert!(
            ide.transcript()
                .contains("Directory not found: red_score/red_score/test")
        );
        assert_eq!(ide.current_directory(), fx.red());
    }

    #[test]
    fn test_jump_back_to_directory_on_stack() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red mm tempi mm q")).unwrap();
        assert_eq!(ide.stack().len(), 3);
        assert_eq!(ide.current_directory(), fx.red().join("materials"));
    }

    #[test]
    fn test_shell_command_prompt() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red ! ls q")).unwrap();
        assert!(ide.transcript().contains("Shell command> ls"));
        assert!(ide.session().has_attempted("shell"));
    }
}
