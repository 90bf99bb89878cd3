//! Menu assembly and token resolution.
//!
//! [`build`] is a pure projection of the filesystem and the registry: two
//! calls with nothing changed in between give equal menus.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::classify::{self, DirectoryKind, Roots};
use crate::command::{CommandKind, Registry, Section};
use crate::error::Result;
use crate::listing;
use crate::names;

/// A numbered, selectable child of the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub number: usize,
    pub name: String,
    pub display: String,
    pub path: PathBuf,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub kind: CommandKind,
    pub token: &'static str,
    pub description: &'static str,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub section: Section,
    pub commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub directory: PathBuf,
    pub kind: DirectoryKind,
    pub assets: Vec<Asset>,
    pub sections: Vec<MenuSection>,
    /// Files that could not be read while listing, shown after the menu.
    pub warnings: Vec<String>,
}

/// What a token names in a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Command(&'a CommandEntry),
    Asset(&'a Asset),
}

pub fn build(directory: &Path, roots: &Roots, registry: &Registry) -> Result<Menu> {
    let kind = classify::classify(directory, roots);
    let in_score = classify::in_score(directory, roots);

    let mut warnings = Vec::new();
    let title = listing::title_with_warnings(directory, roots, &mut warnings)?;
    let assets = listing::visible_with_warnings(directory, roots, &mut warnings)?
        .into_iter()
        .enumerate()
        .map(|(i, l)| Asset {
            number: i + 1,
            name: l.name,
            display: l.display,
            path: l.path,
            is_directory: l.is_directory,
        })
        .collect();

    let applicable: Vec<_> = registry.applicable(kind, in_score, directory).collect();
    let sections = Section::ORDER
        .iter()
        .filter_map(|section| {
            let commands: Vec<CommandEntry> = applicable
                .iter()
                .filter(|c| c.section == *section)
                .map(|c| CommandEntry {
                    kind: c.kind,
                    token: c.token,
                    description: c.description,
                    is_hidden: c.is_hidden,
                })
                .collect();
            (!commands.is_empty()).then_some(MenuSection {
                section: *section,
                commands,
            })
        })
        .collect();

    // The title and the listing both read the score's own metadata.
    let mut seen = HashSet::new();
    warnings.retain(|w| seen.insert(w.clone()));

    Ok(Menu {
        title,
        directory: directory.to_path_buf(),
        kind,
        assets,
        sections,
        warnings,
    })
}

impl Menu {
    /// Rendered lines. Hidden sections appear only with `show_all`.
    pub fn lines(&self, show_all: bool) -> Vec<String> {
        let mut lines = vec![self.title.clone(), String::new()];
        for asset in &self.assets {
            lines.push(format!("{:>4}: {}", asset.number, asset.display));
        }
        if !self.assets.is_empty() {
            lines.push(String::new());
        }
        for section in &self.sections {
            if section.section.is_hidden() && !show_all {
                continue;
            }
            let mut shown = section
                .commands
                .iter()
                .filter(|c| !c.is_hidden || show_all)
                .peekable();
            if shown.peek().is_none() {
                continue;
            }
            for command in shown {
                lines.push(format!("      {} ({})", command.description, command.token));
            }
            lines.push(String::new());
        }
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    pub fn command(&self, token: &str) -> Option<&CommandEntry> {
        self.sections
            .iter()
            .flat_map(|s| s.commands.iter())
            .find(|c| c.token == token)
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.sections.iter().flat_map(|s| s.commands.iter())
    }

    /// Resolve `token`: commands first, then assets by number, exact name,
    /// and case-insensitive prefix of name or display string.
    pub fn resolve(&self, token: &str) -> Option<Resolution<'_>> {
        if let Some(command) = self.command(token) {
            return Some(Resolution::Command(command));
        }
        self.asset(token).map(Resolution::Asset)
    }

    pub fn asset(&self, token: &str) -> Option<&Asset> {
        if let Ok(number) = token.parse::<usize>()
            && let Some(asset) = self.assets.iter().find(|a| a.number == number)
        {
            return Some(asset);
        }
        let wanted = names::untilde(token).to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let exact = self.assets.iter().find(|a| {
            a.name.to_lowercase() == wanted || a.display.to_lowercase() == wanted
        });
        if exact.is_some() {
            return exact;
        }
        self.assets.iter().find(|a| {
            let name = a.name.to_lowercase();
            name.starts_with(&wanted)
                || name.replace('_', " ").starts_with(&wanted)
                || a.display.to_lowercase().starts_with(&wanted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn menu(fx: &Fixture, dir: &Path) -> Menu {
        build(dir, &fx.roots, &Registry::standard()).unwrap()
    }

    #[test]
    fn test_build_is_pure() {
        let fx = Fixture::new();
        let registry = Registry::standard();
        for dir in [
            fx.home().to_path_buf(),
            fx.red(),
            fx.red().join("materials"),
            fx.red().join("segments").join("A"),
            fx.red().join("builds").join("letter"),
        ] {
            let first = build(&dir, &fx.roots, &registry).unwrap();
            let second = build(&dir, &fx.roots, &registry).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_corrupt_score_metadata_warns_once() {
        let fx = Fixture::new();
        std::fs::write(fx.red().join(crate::metadata::METADATA_FILE), "{").unwrap();
        let m = menu(&fx, &fx.red());
        assert_eq!(m.title, "red_score");
        assert_eq!(m.warnings.len(), 1);
        assert!(m.warnings[0].contains("red_score"));
        assert!(menu(&fx, &fx.red().join("materials")).warnings.len() == 1);
    }

    #[test]
    fn test_assets_are_numbered_in_order() {
        let fx = Fixture::new();
        let m = menu(&fx, &fx.red().join("materials"));
        let numbered: Vec<(usize, &str)> =
            m.assets.iter().map(|a| (a.number, a.name.as_str())).collect();
        assert_eq!(
            numbered,
            vec![(1, "magic_numbers"), (2, "ranges"), (3, "tempi")]
        );
        assert_eq!(m.kind, DirectoryKind::Materials);
    }

    #[test]
    fn test_resolve_commands_before_assets() {
        let fx = Fixture::new();
        let m = menu(&fx, fx.home());
        assert!(matches!(m.resolve("new"), Some(Resolution::Command(c)) if c.kind == CommandKind::New));
        match m.resolve("red") {
            Some(Resolution::Asset(a)) => assert_eq!(a.path, fx.red()),
            other => panic!("expected asset, got {:?}", other),
        }
        assert!(m.resolve("zzz").is_none());
        assert!(m.resolve("mm").is_none());
    }

    #[test]
    fn test_resolve_assets_by_number_and_prefix() {
        let fx = Fixture::new();
        let m = menu(&fx, &fx.red().join("materials"));
        assert_eq!(m.asset("2").unwrap().name, "ranges");
        assert_eq!(m.asset("MAGIC").unwrap().name, "magic_numbers");
        assert_eq!(m.asset("magic~num").unwrap().name, "magic_numbers");
        assert_eq!(m.asset("tempi").unwrap().name, "tempi");
        assert!(m.asset("9").is_none());
    }

    #[test]
    fn test_only_basic_section_visible_by_default() {
        let fx = Fixture::new();
        let m = menu(&fx, &fx.red().join("materials"));
        let collapsed = m.lines(false);
        let expanded = m.lines(true);
        assert_eq!(collapsed[0], "Red Score : materials");
        assert!(collapsed.iter().any(|l| l.ends_with("(new)")));
        assert!(!collapsed.iter().any(|l| l.ends_with("(ci)")));
        assert!(expanded.iter().any(|l| l.ends_with("(ci)")));
        assert!(expanded.iter().any(|l| l.ends_with("(q)")));
        assert!(!collapsed.iter().any(|l| l.ends_with("(q)")));
    }

    #[test]
    fn test_required_file_changes_menu() {
        let fx = Fixture::new();
        let package = fx.red().join("segments").join("A");
        assert!(menu(&fx, &package).command("pdfo").is_none());
        std::fs::write(package.join("illustration.pdf"), b"%PDF-1.4\n").unwrap();
        assert!(menu(&fx, &package).command("pdfo").is_some());
    }

    #[test]
    fn test_build_package_commands() {
        let fx = Fixture::new();
        let m = menu(&fx, &fx.red().join("builds").join("letter"));
        for token in ["mlg", "ggc", "mli", "spp", "ci", "<", ">"] {
            assert!(m.command(token).is_some(), "missing {}", token);
        }
        assert!(m.command("df").is_none());
    }
}
