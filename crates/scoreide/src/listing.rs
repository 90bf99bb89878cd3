//! Directory listings as the user sees them: hidden names removed, the
//! selected view applied, sorted for display.

use std::path::{Path, PathBuf};

use crate::classify::{self, DirectoryKind, Roots};
use crate::error::Result;
use crate::metadata::{Metadata, keys};
use crate::names;
use crate::view::{Subject, ViewInventory};

/// One visible entry of a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Listed {
    /// Basename on disk (the outer name for scores).
    pub name: String,
    pub display: String,
    /// Where selecting the entry leads. Scores resolve to the inner directory.
    pub path: PathBuf,
    pub is_directory: bool,
    pub metadata: Metadata,
}

impl Listed {
    fn subject(&self) -> Subject<'_> {
        Subject {
            name: &self.name,
            display: &self.display,
            path: &self.path,
            metadata: &self.metadata,
        }
    }
}

/// `Title (year)` for a score's inner directory.
pub fn score_title(inner: &Path) -> Result<String> {
    let metadata = Metadata::load_or_warn(inner, &mut Vec::new())?;
    Ok(score_title_from(inner, &metadata))
}

fn score_title_from(inner: &Path, metadata: &Metadata) -> String {
    let title = metadata
        .get_str(keys::TITLE)
        .map(str::to_string)
        .unwrap_or_else(|| basename(inner));
    match metadata.get(keys::YEAR).map(crate::metadata::display_value) {
        Some(year) if !year.is_empty() => format!("{} ({})", title, year),
        _ => title,
    }
}

pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Menu title for `directory`.
pub fn title(directory: &Path, roots: &Roots) -> Result<String> {
    title_with_warnings(directory, roots, &mut Vec::new())
}

/// [`title`], collecting unreadable-metadata warnings.
pub fn title_with_warnings(
    directory: &Path,
    roots: &Roots,
    warnings: &mut Vec<String>,
) -> Result<String> {
    let Some(parts) = roots.relative_parts(directory) else {
        return Ok(directory.display().to_string());
    };
    if parts.is_empty() {
        return Ok("scores".to_string());
    }
    let Some(inner) = classify::enclosing_score(directory, roots) else {
        return Ok(directory.display().to_string());
    };
    let mut title = score_title_from(&inner, &Metadata::load_or_warn(&inner, warnings)?);
    let rest: Vec<&str> = if classify::in_score(directory, roots) {
        parts[2..].iter().map(String::as_str).collect()
    } else {
        std::iter::once("wrapper")
            .chain(parts[1..].iter().map(String::as_str))
            .collect()
    };
    for part in rest {
        title.push_str(" : ");
        title.push_str(part);
    }
    Ok(title)
}

/// Entries of `directory` after exclusion, before views and sorting.
pub fn entries(directory: &Path, roots: &Roots) -> Result<Vec<Listed>> {
    entries_with_warnings(directory, roots, &mut Vec::new())
}

fn entries_with_warnings(
    directory: &Path,
    roots: &Roots,
    warnings: &mut Vec<String>,
) -> Result<Vec<Listed>> {
    let kind = classify::classify(directory, roots);
    let mut out = Vec::new();
    if !directory.is_dir() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if names::is_hidden_name(&name) {
            continue;
        }
        let path = entry.path();
        let is_directory = entry.file_type()?.is_dir();
        let listed = match kind {
            DirectoryKind::Scores => {
                let inner = path.join(&name);
                if !is_directory || !inner.is_dir() {
                    continue;
                }
                let metadata = Metadata::load_or_warn(&inner, warnings)?;
                Listed {
                    display: score_title_from(&inner, &metadata),
                    name,
                    path: inner,
                    is_directory: true,
                    metadata,
                }
            }
            DirectoryKind::Segments if is_directory => {
                let metadata = Metadata::load_or_warn(&path, warnings)?;
                Listed {
                    display: metadata
                        .get_str(keys::NAME)
                        .map(str::to_string)
                        .unwrap_or_else(|| name.clone()),
                    name,
                    path,
                    is_directory,
                    metadata,
                }
            }
            _ => {
                let metadata = if is_directory {
                    Metadata::load_or_warn(&path, warnings)?
                } else {
                    Metadata::default()
                };
                Listed {
                    display: name.clone(),
                    name,
                    path,
                    is_directory,
                    metadata,
                }
            }
        };
        out.push(listed);
    }
    Ok(out)
}

/// The listing shown in `directory`: sorted, then narrowed and reordered by
/// the selected view when it is still valid.
pub fn visible(directory: &Path, roots: &Roots) -> Result<Vec<Listed>> {
    visible_with_warnings(directory, roots, &mut Vec::new())
}

/// [`visible`], collecting a line for each metadata or views file that
/// could not be read. Those files count as empty.
pub fn visible_with_warnings(
    directory: &Path,
    roots: &Roots,
    warnings: &mut Vec<String>,
) -> Result<Vec<Listed>> {
    let mut listed = entries_with_warnings(directory, roots, warnings)?;
    listed.sort_by(|a, b| {
        names::sort_key(&a.display)
            .cmp(&names::sort_key(&b.display))
            .then_with(|| a.name.cmp(&b.name))
    });

    let metadata = Metadata::load_or_warn(directory, warnings)?;
    let Some(view_name) = metadata.get_str(keys::VIEW_NAME) else {
        return Ok(listed);
    };
    let inventory = ViewInventory::load_or_warn(directory, warnings)?;
    match inventory.view(view_name) {
        Some(view) => {
            let narrowed = view.apply(listed.clone(), Listed::subject);
            if narrowed.is_empty() {
                log::debug!("view {:?} matches nothing in {}", view_name, directory.display());
                return Ok(listed);
            }
            Ok(narrowed)
        }
        None => {
            log::debug!(
                "view {:?} no longer defined in {}, showing everything",
                view_name,
                directory.display()
            );
            Ok(listed)
        }
    }
}

/// Visible directories only.
pub fn visible_directories(directory: &Path, roots: &Roots) -> Result<Vec<PathBuf>> {
    Ok(visible(directory, roots)?
        .into_iter()
        .filter(|l| l.is_directory)
        .map(|l| l.path)
        .collect())
}
