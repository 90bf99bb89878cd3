//! Creating, copying, renaming and removing scores, packages and files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::candidate::{self, Overwrite};
use crate::classify::{CONTENTS_DIRECTORIES, DirectoryKind};
use crate::collaborators::remove_path;
use crate::controller::Ide;
use crate::error::{IdeError, Result};
use crate::getter::{self, Getter};
use crate::handlers::{build, metadata as metadata_handlers};
use crate::io::Interaction;
use crate::listing;
use crate::menu::Asset;
use crate::metadata::{self, keys};
use crate::names::NamingRule;

pub(crate) fn new(ide: &mut Ide) -> Result<()> {
    match ide.kind() {
        DirectoryKind::Scores => new_score(ide),
        kind @ (DirectoryKind::Materials | DirectoryKind::Segments | DirectoryKind::Builds) => {
            new_package(ide, kind)
        }
        kind => new_file(ide, kind),
    }
}

fn refuse_existing(ide: &mut Ide, path: &Path) -> Result<bool> {
    if path.exists() {
        let shown = ide.trim(path);
        ide.display(&[format!("Already exists: {}", shown)])?;
        return Ok(true);
    }
    Ok(false)
}

fn invalid_name(ide: &mut Ide, name: &str) -> Result<()> {
    ide.show_error(&IdeError::InvalidName(name.to_string()))
}

fn new_score(ide: &mut Ide) -> Result<()> {
    let Some(answers) = Getter::new()
        .text("Score title")
        .integer("Score year", 0, 9999)
        .run(ide)?
    else {
        return Ok(());
    };
    let (Some(title), Some(year)) = (answers[0].text().map(str::to_string), answers[1].integer())
    else {
        return Ok(());
    };
    let Some(name) = NamingRule::Snake.coerce_stem(&title) else {
        return invalid_name(ide, &title);
    };
    let outer = ide.current_directory().join(&name);
    if refuse_existing(ide, &outer)? {
        return Ok(());
    }
    let inner = outer.join(&name);
    for contents in CONTENTS_DIRECTORIES {
        std::fs::create_dir_all(inner.join(contents))?;
    }
    metadata::set(&inner, keys::TITLE, title.as_str())?;
    metadata::set(&inner, keys::YEAR, year)?;
    log::info!("created score {}", inner.display());

    let substitutions = build::substitutions(ide, &inner, None)?;
    if let Some(readme) = build::expand(ide, "README.md", &substitutions)? {
        candidate::make_candidate(
            ide,
            &outer.join("README.md"),
            Overwrite::Prompt,
            candidate::write_bytes(&readme),
        )?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

fn new_package(ide: &mut Ide, container: DirectoryKind) -> Result<()> {
    let Some(answer) = Getter::new().text("Package name").run_one(ide)? else {
        return Ok(());
    };
    let raw = answer.text().unwrap_or_default().to_string();
    let Some(name) = NamingRule::for_container(container).coerce_stem(&raw) else {
        return invalid_name(ide, &raw);
    };
    let directory = ide.current_directory().to_path_buf();
    let package = directory.join(&name);
    if refuse_existing(ide, &package)? {
        return Ok(());
    }
    std::fs::create_dir(&package)?;
    log::info!("created package {}", package.display());

    if container == DirectoryKind::Builds {
        std::fs::create_dir(package.join("_segments"))?;
        metadata::set(&package, keys::PAPER_SIZE, "letter")?;
    } else {
        let substitutions = BTreeMap::from([("PACKAGE_NAME".to_string(), name.clone())]);
        if let Some(definition) = build::expand(ide, "definition.py", &substitutions)? {
            candidate::make_candidate(
                ide,
                &package.join("definition.py"),
                Overwrite::Prompt,
                candidate::write_bytes(&definition),
            )?;
        }
    }
    if container == DirectoryKind::Segments {
        metadata_handlers::renumber(&directory, ide.roots())?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

fn new_file(ide: &mut Ide, kind: DirectoryKind) -> Result<()> {
    let default_extension = match kind {
        DirectoryKind::Stylesheets => Some("ily"),
        DirectoryKind::Tools | DirectoryKind::Test => Some("py"),
        _ => None,
    };
    let Some(answer) = Getter::new().text("File name").run_one(ide)? else {
        return Ok(());
    };
    let raw = answer.text().unwrap_or_default().to_string();
    let Some(name) = NamingRule::for_container(kind).coerce_file_name(&raw, default_extension)
    else {
        return invalid_name(ide, &raw);
    };
    let path = ide.current_directory().join(name);
    if refuse_existing(ide, &path)? {
        return Ok(());
    }
    std::fs::write(&path, "")?;
    ide.session_mut().request_menu_rebuild();
    ide.edit_file(&path)
}

fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    if source.is_dir() {
        std::fs::create_dir_all(target)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_tree(&entry.path(), &target.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(source, target)?;
    }
    Ok(())
}

/// Copy an asset from the same kind of directory in another score.
pub(crate) fn copy(ide: &mut Ide) -> Result<()> {
    let kind = ide.kind();
    let Some(contents) = kind.contents_name() else {
        return Ok(());
    };
    let own_score = ide.score();
    let home = ide.roots().home(ide.session().is_test()).to_path_buf();

    let mut labels = Vec::new();
    let mut sources = Vec::new();
    for score in listing::visible_directories(&home, ide.roots())? {
        if own_score.as_ref() == Some(&score) {
            continue;
        }
        let title = listing::score_title(&score)?;
        for listed in listing::visible(&score.join(contents), ide.roots())? {
            labels.push(format!("{} : {}", title, listed.display));
            sources.push(listed.path);
        }
    }
    if sources.is_empty() {
        return ide.display(&["Nothing to copy.".to_string()]);
    }
    let Some(index) = getter::select(ide, "Copy from", &labels)? else {
        return Ok(());
    };
    let source = sources.swap_remove(index);
    let Some(file_name) = source.file_name() else {
        return Ok(());
    };
    let target = ide.current_directory().join(file_name);
    if refuse_existing(ide, &target)? {
        return Ok(());
    }
    let message = format!("Copy {} to {}?", ide.trim(&source), ide.trim(&target));
    if !ide.confirm(&message)? {
        return Ok(());
    }
    copy_tree(&source, &target)?;
    log::info!("copied {} to {}", source.display(), target.display());
    if kind == DirectoryKind::Segments {
        metadata_handlers::renumber(ide.current_directory(), ide.roots())?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

fn assets(ide: &Ide) -> Vec<Asset> {
    ide.menu().map(|m| m.assets.clone()).unwrap_or_default()
}

pub(crate) fn rename(ide: &mut Ide) -> Result<()> {
    let assets = assets(ide);
    if assets.is_empty() {
        return ide.display(&["Nothing to rename.".to_string()]);
    }
    let labels: Vec<String> = assets.iter().map(|a| a.display.clone()).collect();
    let Some(index) = getter::select(ide, "Rename which", &labels)? else {
        return Ok(());
    };
    let Some(answer) = Getter::new().text("New name").run_one(ide)? else {
        return Ok(());
    };
    let raw = answer.text().unwrap_or_default().to_string();
    let asset = &assets[index];
    let kind = ide.kind();
    let rule = NamingRule::for_container(kind);

    let coerced = if kind == DirectoryKind::Scores {
        NamingRule::Snake.coerce_stem(&raw)
    } else if asset.is_directory {
        rule.coerce_stem(&raw)
    } else {
        let extension = asset.path.extension().map(|e| e.to_string_lossy().into_owned());
        rule.coerce_file_name(&raw, extension.as_deref())
    };
    let Some(new_name) = coerced else {
        return invalid_name(ide, &raw);
    };
    // Scores rename through their wrapper.
    let from = if kind == DirectoryKind::Scores {
        match asset.path.parent() {
            Some(outer) => outer.to_path_buf(),
            None => return Ok(()),
        }
    } else {
        asset.path.clone()
    };
    let to = from.with_file_name(&new_name);
    if refuse_existing(ide, &to)? {
        return Ok(());
    }
    let lines = vec![
        "Will rename ...".to_string(),
        format!("  FROM: {}", ide.trim(&from)),
        format!("    TO: {}", ide.trim(&to)),
    ];
    ide.display(&lines)?;
    if !ide.confirm("Ok?")? {
        return Ok(());
    }
    if kind == DirectoryKind::Scores {
        rename_score(&asset.path, &from, &new_name)?;
    } else {
        std::fs::rename(&from, &to)?;
    }
    log::info!("renamed {} to {}", from.display(), to.display());
    if kind == DirectoryKind::Segments {
        metadata_handlers::renumber(ide.current_directory(), ide.roots())?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

/// Rename the inner score directory, then its wrapper. A failed wrapper
/// rename puts the inner directory back.
fn rename_score(inner: &Path, outer: &Path, new_name: &str) -> Result<()> {
    let moved = outer.join(new_name);
    std::fs::rename(inner, &moved)?;
    let to = outer.with_file_name(new_name);
    if let Err(e) = std::fs::rename(outer, &to) {
        let restored = std::fs::rename(&moved, inner);
        let context = match restored {
            Ok(()) => format!(
                "could not rename {} to {}; left unchanged",
                outer.display(),
                to.display()
            ),
            Err(_) => format!(
                "could not rename {} to {}; inner directory is now {}",
                outer.display(),
                to.display(),
                moved.display()
            ),
        };
        return Err(IdeError::Other(anyhow::Error::new(e).context(context)));
    }
    Ok(())
}

pub(crate) fn remove(ide: &mut Ide) -> Result<()> {
    let assets = assets(ide);
    if assets.is_empty() {
        return ide.display(&["Nothing to remove.".to_string()]);
    }
    let names: Vec<String> = assets.iter().map(|a| a.name.clone()).collect();
    let Some(answer) = Getter::new()
        .selection("Assets to remove", names)
        .run_one(ide)?
    else {
        return Ok(());
    };
    let kind = ide.kind();
    let targets: Vec<PathBuf> = answer
        .selection()
        .unwrap_or_default()
        .iter()
        .filter_map(|&i| assets.get(i))
        .filter_map(|asset| {
            if kind == DirectoryKind::Scores {
                asset.path.parent().map(Path::to_path_buf)
            } else {
                Some(asset.path.clone())
            }
        })
        .collect();

    let mut lines = vec!["Will remove ...".to_string()];
    lines.extend(targets.iter().map(|t| format!("  {}", ide.trim(t))));
    ide.display(&lines)?;
    if !ide.session().skip_confirmation()
        && Getter::new()
            .exact("Type 'remove' to proceed", "remove")
            .run_one(ide)?
            .is_none()
    {
        return Ok(());
    }

    for target in &targets {
        let tracked = !ide.session().is_test()
            && match ide.repository.is_tracked(target) {
                Ok(tracked) => tracked,
                Err(e) => {
                    log::warn!("could not query {}: {}", target.display(), e);
                    false
                }
            };
        if tracked {
            match ide.repository.remove(target) {
                Ok(lines) => ide.display(&lines)?,
                Err(e) => ide.show_error(&e)?,
            }
        } else {
            remove_path(target)?;
        }
        log::info!("removed {}", target.display());
    }
    if kind == DirectoryKind::Segments {
        metadata_handlers::renumber(ide.current_directory(), ide.roots())?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}
